//! Concurrent directory indexing and name search.
//!
//! This crate provides:
//! - A crawl engine that indexes every file under a root directory, using a
//!   bounded worker pool, a single-threaded recursive walk or a capped
//!   thread-per-directory fan-out
//! - An index bucketed by a polynomial fingerprint of each file name
//! - Substring search over names, from a live walk or a finished index

pub mod cancel;
pub mod crawl;
pub mod error;
pub mod fingerprint;
pub mod listing;
pub mod search;
pub mod types;

// Re-export main types
pub use cancel::CancellationToken;
pub use crawl::{
    CrawlEngine, CrawlOptions, IndexSnapshot, IndexStore, SchedulingPolicy, WorkQueue,
};
pub use error::{IndexerError, Result};
pub use fingerprint::{fingerprint, Fingerprint};
pub use listing::{DirectoryLister, FsLister, ListedEntry};
pub use search::SearchEngine;
pub use types::{CrawlReport, CrawlStatus, PathRecord, SearchOutcome, SkipReason, SkippedPath};
