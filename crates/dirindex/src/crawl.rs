//! Concurrent directory crawling.
//!
//! This module builds the in-memory file index:
//! - Scheduling directories onto threads (`engine`)
//! - Handing directories between workers and detecting completion (`queue`)
//! - Bucketing file records by name fingerprint (`store`)

mod engine;
mod options;
mod queue;
mod store;

// Re-export main types
pub use engine::CrawlEngine;
pub use options::{
    default_worker_count, CrawlOptions, SchedulingPolicy, DEFAULT_FAN_OUT_THREADS,
};
pub use queue::{WorkClaim, WorkQueue};
pub use store::{IndexSnapshot, IndexStore};
