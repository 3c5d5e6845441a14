//! Result types for crawl and search operations.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crawl::IndexSnapshot;
use crate::error::{IndexerError, Result};

/// One discovered filesystem entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PathRecord {
    pub name: String,
    pub full_path: PathBuf,
    pub is_directory: bool,
}

impl PathRecord {
    /// Creates a record for the entry `name` inside `parent`.
    pub fn new(parent: &Path, name: &str, is_directory: bool) -> Self {
        Self {
            name: name.to_owned(),
            full_path: parent.join(name),
            is_directory,
        }
    }
}

/// Why a directory was left out of a crawl or search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AccessDenied,
    NotFound,
    Enumeration(String),
}

impl SkipReason {
    pub fn from_io(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::AccessDenied,
            io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::Enumeration(error.to_string()),
        }
    }
}

/// A directory whose listing failed; its subtree is absent from the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPath {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Whether a crawl ran to the end or stopped on a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    Complete,
    Cancelled,
}

impl CrawlStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Outcome of one crawl.
#[derive(Debug)]
pub struct CrawlReport {
    /// The root path that was crawled.
    pub root: PathBuf,
    /// Number of files indexed. Always equals `index.total_records()`.
    pub file_count: usize,
    /// Number of subdirectories discovered beneath the root.
    pub directory_count: usize,
    /// The finished index.
    pub index: IndexSnapshot,
    /// Directories that could not be listed.
    pub skipped: Vec<SkippedPath>,
    /// Directories discovered but never listed because of cancellation.
    pub unvisited_directories: usize,
    pub status: CrawlStatus,
    pub elapsed: Duration,
}

impl CrawlReport {
    pub fn is_complete(&self) -> bool {
        self.status == CrawlStatus::Complete
    }

    /// Returns the report if the crawl finished, `Cancelled` otherwise.
    pub fn require_complete(self) -> Result<Self> {
        match self.status {
            CrawlStatus::Complete => Ok(self),
            CrawlStatus::Cancelled => Err(IndexerError::Cancelled),
        }
    }
}

/// Outcome of one search.
#[derive(Debug)]
pub struct SearchOutcome {
    /// The query that was executed.
    pub query: String,
    /// Matching entries, sorted by full path.
    pub matches: Vec<PathRecord>,
    /// Number of entries looked at.
    pub entries_scanned: usize,
    /// Subdirectories that could not be opened.
    pub skipped: Vec<SkippedPath>,
    pub elapsed: Duration,
    /// Whether the search stopped early on a cancellation request.
    pub cancelled: bool,
}

impl SearchOutcome {
    pub fn found(&self) -> bool {
        !self.matches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_joins_parent_and_name() {
        let record = PathRecord::new(Path::new("/data/logs"), "app.log", false);
        assert_eq!(record.name, "app.log");
        assert_eq!(record.full_path, Path::new("/data/logs/app.log"));
        assert!(!record.is_directory);
    }

    #[test]
    fn skip_reason_follows_error_kind() {
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(SkipReason::from_io(&denied), SkipReason::AccessDenied);

        let missing = io::Error::from(io::ErrorKind::NotFound);
        assert_eq!(SkipReason::from_io(&missing), SkipReason::NotFound);

        let other = io::Error::other("stale handle");
        assert_eq!(
            SkipReason::from_io(&other),
            SkipReason::Enumeration("stale handle".to_string())
        );
    }
}
