//! CrawlEngine - lists a root directory and indexes every file beneath it.
//!
//! The root is always listed by the calling thread, so a root that cannot be
//! opened fails the whole crawl. Everything below the root is scheduled by
//! the configured [`SchedulingPolicy`]:
//!
//! - `WorkerPool`: fixed set of workers sharing a [`WorkQueue`] and an
//!   [`IndexStore`]. Termination follows the queue's in-flight count.
//! - `Recursive`: the calling thread walks depth-first into a private index.
//! - `FanOut`: a thread per subdirectory while under the cap, inline beyond it.
//!
//! A subdirectory that cannot be listed is logged and reported as skipped;
//! the rest of the crawl carries on.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, Scope};
use std::time::Instant;

use parking_lot::Mutex;

use super::options::{CrawlOptions, SchedulingPolicy};
use super::queue::WorkQueue;
use super::store::{IndexSnapshot, IndexStore};
use crate::error::{worker_panicked_error, IndexerError, Result};
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::listing::{DirectoryLister, FsLister, ListedEntry};
use crate::types::{CrawlReport, CrawlStatus, PathRecord, SkipReason, SkippedPath};

/// Results a thread accumulates privately and hands back when it is done.
#[derive(Debug, Default)]
struct WorkerTally {
    skipped: Vec<SkippedPath>,
    /// Subdirectories discovered.
    discovered: usize,
    /// Directories dropped because of cancellation.
    unvisited: usize,
    listed: usize,
    cancelled: bool,
}

impl WorkerTally {
    fn skip(&mut self, path: &Path, error: &io::Error) {
        log::warn!("skipping directory {}: {}", path.display(), error);
        self.skipped.push(SkippedPath {
            path: path.to_path_buf(),
            reason: SkipReason::from_io(error),
        });
    }

    fn merge(&mut self, other: WorkerTally) {
        self.skipped.extend(other.skipped);
        self.discovered += other.discovered;
        self.unvisited += other.unvisited;
        self.listed += other.listed;
        self.cancelled |= other.cancelled;
    }
}

/// Splits a listing into subdirectories and file records.
///
/// Fingerprints are computed here, before any index lock is taken.
fn dispatch(
    dir: &Path,
    entries: Vec<ListedEntry>,
    mut on_directory: impl FnMut(PathBuf),
    mut on_file: impl FnMut(Fingerprint, PathRecord),
) {
    for entry in entries {
        if entry.is_directory {
            if !entry.is_self_or_parent() {
                on_directory(entry.child_path(dir));
            }
        } else {
            let key = fingerprint(&entry.name);
            on_file(key, entry.into_record(dir));
        }
    }
}

/// Drives crawls with a fixed configuration.
#[derive(Debug, Default)]
pub struct CrawlEngine<L = FsLister> {
    options: CrawlOptions,
    lister: L,
}

impl CrawlEngine {
    /// Creates an engine that lists directories with `std::fs`.
    pub fn new(options: CrawlOptions) -> Self {
        Self::with_lister(options, FsLister)
    }
}

impl<L: DirectoryLister> CrawlEngine<L> {
    pub fn with_lister(options: CrawlOptions, lister: L) -> Self {
        Self { options, lister }
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Indexes every file under `root`.
    ///
    /// Fails if the policy is misconfigured or `root` cannot be listed. A
    /// cancelled crawl still returns the records gathered so far, with
    /// `CrawlStatus::Cancelled`.
    pub fn crawl(&self, root: impl AsRef<Path>) -> Result<CrawlReport> {
        let root = root.as_ref();
        let policy = self.options.policy.validate()?;
        let started = Instant::now();

        let entries = self
            .lister
            .list(root)
            .map_err(|error| IndexerError::from_listing(root, error))?;

        let (index, tally) = match policy {
            SchedulingPolicy::WorkerPool { workers } => self.run_pool(root, entries, workers)?,
            SchedulingPolicy::Recursive => self.run_recursive(root, entries),
            SchedulingPolicy::FanOut { max_threads } => {
                self.run_fan_out(root, entries, max_threads)
            }
        };

        let status = if tally.cancelled {
            CrawlStatus::Cancelled
        } else {
            CrawlStatus::Complete
        };
        let elapsed = started.elapsed();

        log::info!(
            "crawl finished root={} policy={} status={} files={} dirs={} skipped={} unvisited={} elapsed_ms={}",
            root.display(),
            policy.as_str(),
            status.as_str(),
            index.file_count(),
            tally.discovered,
            tally.skipped.len(),
            tally.unvisited,
            elapsed.as_millis(),
        );

        Ok(CrawlReport {
            root: root.to_path_buf(),
            file_count: index.file_count(),
            directory_count: tally.discovered,
            index,
            skipped: tally.skipped,
            unvisited_directories: tally.unvisited,
            status,
            elapsed,
        })
    }

    fn is_cancelled(&self) -> bool {
        self.options
            .cancel
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }

    fn run_pool(
        &self,
        root: &Path,
        entries: Vec<ListedEntry>,
        workers: usize,
    ) -> Result<(IndexSnapshot, WorkerTally)> {
        let queue = WorkQueue::new();
        let store = IndexStore::new();

        let root_claim = queue.seed(root.to_path_buf());
        dispatch(
            root,
            entries,
            |dir| queue.push(dir),
            |key, record| store.insert(key, record),
        );
        drop(root_claim);

        let mut tally = thread::scope(|s| -> Result<WorkerTally> {
            let mut handles = Vec::with_capacity(workers);
            for id in 0..workers {
                let (queue, store) = (&queue, &store);
                let spawned = thread::Builder::new()
                    .name(format!("crawl-worker-{id}"))
                    .spawn_scoped(s, move || self.worker_loop(id, queue, store));
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(error) => log::warn!("crawl worker {id} failed to start: {error}"),
                }
            }

            if handles.is_empty() {
                queue.abort();
                return Err(IndexerError::Internal(
                    "no crawl worker could be started".to_string(),
                ));
            }

            let mut tally = WorkerTally::default();
            let mut panicked = false;
            for handle in handles {
                match handle.join() {
                    Ok(worker) => tally.merge(worker),
                    Err(_) => panicked = true,
                }
            }
            if panicked {
                return Err(worker_panicked_error("crawl worker"));
            }
            Ok(tally)
        })?;

        tally.discovered = queue.discovered();
        Ok((store.into_snapshot(), tally))
    }

    fn worker_loop(&self, id: usize, queue: &WorkQueue, store: &IndexStore) -> WorkerTally {
        let mut tally = WorkerTally::default();

        while let Some(claim) = queue.pop_blocking() {
            if self.is_cancelled() {
                tally.cancelled = true;
                tally.unvisited += 1 + queue.abort();
                continue;
            }

            match self.lister.list(claim.path()) {
                Ok(entries) => {
                    tally.listed += 1;
                    dispatch(
                        claim.path(),
                        entries,
                        |dir| queue.push(dir),
                        |key, record| store.insert(key, record),
                    );
                }
                Err(error) => tally.skip(claim.path(), &error),
            }
        }

        log::debug!(
            "crawl worker {id} exiting listed={} skipped={}",
            tally.listed,
            tally.skipped.len()
        );
        tally
    }

    fn run_recursive(
        &self,
        root: &Path,
        entries: Vec<ListedEntry>,
    ) -> (IndexSnapshot, WorkerTally) {
        let mut index = IndexSnapshot::default();
        let mut tally = WorkerTally::default();
        let mut stack = Vec::new();

        dispatch(
            root,
            entries,
            |dir| stack.push(dir),
            |key, record| index.insert(key, record),
        );
        tally.discovered += stack.len();

        while let Some(dir) = stack.pop() {
            if self.is_cancelled() {
                tally.cancelled = true;
                tally.unvisited += 1 + stack.len();
                break;
            }

            match self.lister.list(&dir) {
                Ok(entries) => {
                    tally.listed += 1;
                    let before = stack.len();
                    dispatch(
                        &dir,
                        entries,
                        |child| stack.push(child),
                        |key, record| index.insert(key, record),
                    );
                    tally.discovered += stack.len() - before;
                }
                Err(error) => tally.skip(&dir, &error),
            }
        }

        (index, tally)
    }

    fn run_fan_out(
        &self,
        root: &Path,
        entries: Vec<ListedEntry>,
        max_threads: usize,
    ) -> (IndexSnapshot, WorkerTally) {
        let fan_out = FanOut {
            engine: self,
            store: IndexStore::new(),
            live_threads: AtomicUsize::new(0),
            max_threads,
            tally: Mutex::new(WorkerTally::default()),
        };

        thread::scope(|s| fan_out.expand(s, root.to_path_buf(), entries));

        let FanOut { store, tally, .. } = fan_out;
        (store.into_snapshot(), tally.into_inner())
    }
}

/// Shared state of a fan-out crawl.
struct FanOut<'a, L> {
    engine: &'a CrawlEngine<L>,
    store: IndexStore,
    live_threads: AtomicUsize,
    max_threads: usize,
    tally: Mutex<WorkerTally>,
}

/// A slot in the fan-out thread budget, returned on drop.
struct ThreadPermit<'a>(&'a AtomicUsize);

impl Drop for ThreadPermit<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<L: DirectoryLister> FanOut<'_, L> {
    fn acquire(&self) -> Option<ThreadPermit<'_>> {
        self.live_threads
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                (live < self.max_threads).then_some(live + 1)
            })
            .ok()
            .map(|_| ThreadPermit(&self.live_threads))
    }

    /// Indexes `dir` and everything below it. Subdirectories go to new
    /// threads while permits last; the rest are walked here from an
    /// explicit stack.
    fn expand<'scope, 'env>(
        &'scope self,
        scope: &'scope Scope<'scope, 'env>,
        dir: PathBuf,
        entries: Vec<ListedEntry>,
    ) {
        let mut inline = Vec::new();
        self.spread(scope, &dir, entries, &mut inline);

        while let Some(dir) = inline.pop() {
            if self.engine.is_cancelled() {
                let mut tally = self.tally.lock();
                tally.cancelled = true;
                tally.unvisited += 1 + inline.len();
                return;
            }
            match self.engine.lister.list(&dir) {
                Ok(entries) => self.spread(scope, &dir, entries, &mut inline),
                Err(error) => self.tally.lock().skip(&dir, &error),
            }
        }
    }

    /// Records the files of one listing and hands each subdirectory either
    /// to a fresh thread or to `inline`.
    fn spread<'scope, 'env>(
        &'scope self,
        scope: &'scope Scope<'scope, 'env>,
        dir: &Path,
        entries: Vec<ListedEntry>,
        inline: &mut Vec<PathBuf>,
    ) {
        let mut subdirs = Vec::new();
        dispatch(
            dir,
            entries,
            |child| subdirs.push(child),
            |key, record| self.store.insert(key, record),
        );
        {
            let mut tally = self.tally.lock();
            tally.listed += 1;
            tally.discovered += subdirs.len();
        }

        for sub in subdirs {
            let Some(permit) = self.acquire() else {
                inline.push(sub);
                continue;
            };
            let child = sub.clone();
            let spawned = thread::Builder::new()
                .name("crawl-fan-out".to_string())
                .spawn_scoped(scope, move || {
                    let _permit = permit;
                    self.visit(scope, child);
                });
            if let Err(error) = spawned {
                log::warn!(
                    "fan-out thread failed to start, walking {} inline: {error}",
                    sub.display()
                );
                inline.push(sub);
            }
        }
    }

    fn visit<'scope, 'env>(&'scope self, scope: &'scope Scope<'scope, 'env>, dir: PathBuf) {
        if self.engine.is_cancelled() {
            let mut tally = self.tally.lock();
            tally.cancelled = true;
            tally.unvisited += 1;
            return;
        }

        match self.engine.lister.list(&dir) {
            Ok(entries) => self.expand(scope, dir, entries),
            Err(error) => self.tally.lock().skip(&dir, &error),
        }
    }
}
