//! Substring search over entry names.
//!
//! Two sources are supported: a live walk of the directory tree, and a
//! finished [`IndexSnapshot`]. Matching is a case-sensitive literal substring
//! test on the entry name.

use std::path::{Path, PathBuf};
use std::time::Instant;

use memchr::memmem;
use rayon::prelude::*;

use crate::cancel::CancellationToken;
use crate::crawl::IndexSnapshot;
use crate::error::{IndexerError, Result};
use crate::listing::{DirectoryLister, FsLister, ListedEntry};
use crate::types::{PathRecord, SearchOutcome, SkipReason, SkippedPath};

/// A listed directory waiting to be scanned.
type Listing = (PathBuf, Vec<ListedEntry>);

/// Partial results of a tree walk, merged level by level.
#[derive(Debug, Default)]
struct TreeScan {
    matches: Vec<PathRecord>,
    scanned: usize,
    skipped: Vec<SkippedPath>,
    cancelled: bool,
    /// Subdirectories listed during this level, scanned in the next one.
    next: Vec<Listing>,
}

impl TreeScan {
    fn merge(mut self, other: TreeScan) -> TreeScan {
        self.matches.extend(other.matches);
        self.scanned += other.scanned;
        self.skipped.extend(other.skipped);
        self.cancelled |= other.cancelled;
        self.next.extend(other.next);
        self
    }
}

fn validate_query(query: &str) -> Result<()> {
    if query.is_empty() {
        return Err(IndexerError::InvalidInput(
            "search query must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[inline]
fn name_matches(name: &str, query: &str) -> bool {
    memmem::find(name.as_bytes(), query.as_bytes()).is_some()
}

/// Finds entries whose names contain a query string.
#[derive(Debug, Default)]
pub struct SearchEngine<L = FsLister> {
    lister: L,
    cancel: Option<CancellationToken>,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::with_lister(FsLister)
    }
}

impl<L: DirectoryLister> SearchEngine<L> {
    pub fn with_lister(lister: L) -> Self {
        Self {
            lister,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }

    /// Walks the tree under `root` and returns every file or directory whose
    /// name contains `query`.
    ///
    /// Fails if `root` cannot be listed. Subdirectories that cannot be
    /// listed are logged and reported in `skipped`.
    pub fn search_tree(&self, root: impl AsRef<Path>, query: &str) -> Result<SearchOutcome> {
        let root = root.as_ref();
        validate_query(query)?;
        let started = Instant::now();

        let entries = self
            .lister
            .list(root)
            .map_err(|error| IndexerError::from_listing(root, error))?;
        let mut scan = self.scan(root, entries, query);
        scan.matches
            .sort_unstable_by(|a, b| a.full_path.cmp(&b.full_path));

        log::debug!(
            "tree search root={} query={:?} matches={} scanned={} skipped={}",
            root.display(),
            query,
            scan.matches.len(),
            scan.scanned,
            scan.skipped.len(),
        );

        Ok(SearchOutcome {
            query: query.to_string(),
            matches: scan.matches,
            entries_scanned: scan.scanned,
            skipped: scan.skipped,
            elapsed: started.elapsed(),
            cancelled: scan.cancelled,
        })
    }

    /// Scans the tree one level at a time. Every entry of a level is
    /// handled in parallel; the subdirectories it lists form the next level.
    fn scan(&self, root: &Path, entries: Vec<ListedEntry>, query: &str) -> TreeScan {
        let mut total = TreeScan::default();
        let mut level = vec![(root.to_path_buf(), entries)];

        while !level.is_empty() {
            let mut scan = level
                .into_par_iter()
                .flat_map(|(dir, entries)| {
                    entries
                        .into_par_iter()
                        .map(move |entry| self.scan_entry(&dir, entry, query))
                })
                .reduce(TreeScan::default, TreeScan::merge);
            level = std::mem::take(&mut scan.next);
            total = total.merge(scan);
        }
        total
    }

    fn scan_entry(&self, dir: &Path, entry: ListedEntry, query: &str) -> TreeScan {
        let mut scan = TreeScan::default();
        if entry.is_self_or_parent() {
            return scan;
        }
        scan.scanned = 1;
        let path = entry.child_path(dir);

        if entry.is_directory {
            if self.is_cancelled() {
                scan.cancelled = true;
            } else {
                match self.lister.list(&path) {
                    Ok(children) => scan.next.push((path, children)),
                    Err(error) => {
                        log::warn!("search skipping {}: {}", path.display(), error);
                        scan.skipped.push(SkippedPath {
                            path,
                            reason: SkipReason::from_io(&error),
                        });
                    }
                }
            }
        }

        if name_matches(&entry.name, query) {
            scan.matches.push(entry.into_record(dir));
        }
        scan
    }

    /// Searches the file names of a finished index.
    pub fn search_index(&self, index: &IndexSnapshot, query: &str) -> Result<SearchOutcome> {
        validate_query(query)?;
        let started = Instant::now();

        let mut matches = Vec::new();
        let mut scanned = 0;
        let mut cancelled = false;
        for (i, record) in index.records().enumerate() {
            // Sparse cancellation check
            if let Some(token) = &self.cancel {
                if token.check_sparse(i).is_none() {
                    cancelled = true;
                    break;
                }
            }
            scanned += 1;
            if name_matches(&record.name, query) {
                matches.push(record.clone());
            }
        }
        matches.sort_unstable_by(|a, b| a.full_path.cmp(&b.full_path));

        Ok(SearchOutcome {
            query: query.to_string(),
            matches,
            entries_scanned: scanned,
            skipped: Vec::new(),
            elapsed: started.elapsed(),
            cancelled,
        })
    }
}
