//! Fingerprint-bucketed file index.
//!
//! [`IndexSnapshot`] is the plain data structure; [`IndexStore`] wraps one
//! behind a single lock so the bucket map and the file count change together.

use std::path::Path;

use fnv::FnvHashMap;
use parking_lot::Mutex;

use crate::fingerprint::{fingerprint, Fingerprint};
use crate::types::PathRecord;

/// Immutable view of a finished index.
#[derive(Debug, Default, Clone)]
pub struct IndexSnapshot {
    buckets: FnvHashMap<Fingerprint, Vec<PathRecord>>,
    file_count: usize,
}

impl IndexSnapshot {
    /// Appends `record` to its bucket. Only reachable through a lock or from
    /// a single thread.
    pub(crate) fn insert(&mut self, key: Fingerprint, record: PathRecord) {
        self.buckets.entry(key).or_default().push(record);
        self.file_count += 1;
    }

    /// Number of files indexed.
    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn is_empty(&self) -> bool {
        self.file_count == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Sum of all bucket sizes.
    pub fn total_records(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Records sharing `key`, in insertion order.
    pub fn bucket(&self, key: Fingerprint) -> &[PathRecord] {
        self.buckets.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn buckets(&self) -> impl Iterator<Item = (Fingerprint, &[PathRecord])> {
        self.buckets
            .iter()
            .map(|(key, records)| (*key, records.as_slice()))
    }

    pub fn records(&self) -> impl Iterator<Item = &PathRecord> {
        self.buckets.values().flatten()
    }

    /// Records whose name is exactly `name`, skipping fingerprint collisions.
    pub fn find_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a PathRecord> {
        self.bucket(fingerprint(name))
            .iter()
            .filter(move |record| record.name == name)
    }

    /// Every indexed path in lexicographic order.
    pub fn sorted_paths(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = self.records().map(|r| r.full_path.as_path()).collect();
        paths.sort_unstable();
        paths
    }
}

/// Index shared by crawl workers.
#[derive(Debug, Default)]
pub struct IndexStore {
    inner: Mutex<IndexSnapshot>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `record` to the bucket for `key` and counts it.
    ///
    /// Callers compute the fingerprint before calling so the critical
    /// section is the insert alone.
    pub fn insert(&self, key: Fingerprint, record: PathRecord) {
        self.inner.lock().insert(key, record);
    }

    /// Consumes the store once no worker holds it any more.
    pub fn into_snapshot(self) -> IndexSnapshot {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn record(dir: &str, name: &str) -> PathRecord {
        PathRecord::new(Path::new(dir), name, false)
    }

    #[test]
    fn insert_creates_and_extends_buckets() {
        let mut index = IndexSnapshot::default();
        index.insert(7, record("/a", "x"));
        index.insert(7, record("/b", "x"));
        index.insert(9, record("/a", "y"));

        assert_eq!(index.file_count(), 3);
        assert_eq!(index.bucket_count(), 2);
        assert_eq!(index.bucket(7).len(), 2);
        assert_eq!(index.bucket(7)[0].full_path, Path::new("/a/x"));
        assert!(index.bucket(8).is_empty());
        assert_eq!(index.total_records(), index.file_count());
    }

    #[test]
    fn find_by_name_filters_collisions() {
        let mut index = IndexSnapshot::default();
        let key = fingerprint("notes.md");
        index.insert(key, record("/a", "notes.md"));
        // Forced collision: same bucket, different name.
        index.insert(key, record("/a", "other.md"));
        index.insert(key, record("/b", "notes.md"));

        let found: Vec<_> = index.find_by_name("notes.md").collect();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|r| r.name == "notes.md"));
    }

    #[test]
    fn sorted_paths_are_lexicographic() {
        let mut index = IndexSnapshot::default();
        for (dir, name) in [("/z", "b"), ("/a", "c"), ("/a", "a")] {
            index.insert(fingerprint(name), record(dir, name));
        }
        assert_eq!(
            index.sorted_paths(),
            vec![Path::new("/a/a"), Path::new("/a/c"), Path::new("/z/b")]
        );
    }

    #[test]
    fn concurrent_inserts_lose_nothing() {
        const THREADS: usize = 16;
        const PER_THREAD: usize = 500;

        let store = IndexStore::new();
        thread::scope(|s| {
            for t in 0..THREADS {
                let store = &store;
                s.spawn(move || {
                    for i in 0..PER_THREAD {
                        let name = format!("file-{t}-{i}");
                        store.insert(fingerprint(&name), record("/t", &name));
                    }
                });
            }
        });

        let index = store.into_snapshot();
        assert_eq!(index.file_count(), THREADS * PER_THREAD);
        assert_eq!(index.total_records(), THREADS * PER_THREAD);

        let mut names: Vec<_> = index.records().map(|r| r.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), THREADS * PER_THREAD);
    }
}
