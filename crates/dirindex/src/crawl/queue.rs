//! Work queue of pending directories.
//!
//! A single mutex guards the pending paths, the in-flight counter and the
//! termination flag. A directory is in flight from the moment it is pushed
//! until the worker that claimed it drops its [`WorkClaim`]. Termination is
//! signalled when the in-flight count reaches zero, which implies the queue
//! is empty, so a worker that is still dispatching always keeps its siblings
//! waiting for the subdirectories it may push.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<PathBuf>,
    /// Directories pushed (or seeded) but not yet fully processed.
    in_flight: usize,
    /// Directories ever pushed.
    discovered: usize,
    terminated: bool,
}

/// Thread-safe FIFO of directories with blocking dequeue.
#[derive(Debug, Default)]
pub struct WorkQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `path` as in flight without queueing it.
    ///
    /// Used for the root, which the engine lists itself before any worker
    /// starts. Dropping the claim after dispatching the root's children
    /// terminates the queue if the root had no subdirectories.
    pub fn seed(&self, path: PathBuf) -> WorkClaim<'_> {
        self.state.lock().in_flight += 1;
        WorkClaim { queue: self, path }
    }

    /// Appends a directory and wakes one waiting worker.
    pub fn push(&self, path: PathBuf) {
        {
            let mut state = self.state.lock();
            state.pending.push_back(path);
            state.in_flight += 1;
            state.discovered += 1;
        }
        self.available.notify_one();
    }

    /// Claims the next directory, blocking while the queue is empty and work
    /// may still arrive. Returns `None` once the queue has terminated and
    /// holds nothing.
    pub fn pop_blocking(&self) -> Option<WorkClaim<'_>> {
        let mut state = self.state.lock();
        loop {
            if let Some(path) = state.pending.pop_front() {
                return Some(WorkClaim { queue: self, path });
            }
            if state.terminated {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    /// Marks the queue as finished and wakes every waiting worker. Idempotent.
    pub fn signal_termination(&self) {
        self.state.lock().terminated = true;
        self.available.notify_all();
    }

    /// Drops every pending directory and terminates the queue.
    ///
    /// Returns the number of directories dropped.
    pub fn abort(&self) -> usize {
        let dropped = {
            let mut state = self.state.lock();
            let dropped = state.pending.len();
            state.pending.clear();
            state.in_flight -= dropped;
            state.terminated = true;
            dropped
        };
        self.available.notify_all();
        dropped
    }

    /// Number of directories ever pushed.
    pub fn discovered(&self) -> usize {
        self.state.lock().discovered
    }

    pub fn is_terminated(&self) -> bool {
        self.state.lock().terminated
    }

    fn finish_one(&self) {
        let terminate = {
            let mut state = self.state.lock();
            state.in_flight -= 1;
            if state.in_flight == 0 && state.pending.is_empty() && !state.terminated {
                state.terminated = true;
                true
            } else {
                false
            }
        };
        if terminate {
            self.available.notify_all();
        }
    }
}

/// A claimed directory. Dropping it marks the directory as fully processed.
#[derive(Debug)]
pub struct WorkClaim<'a> {
    queue: &'a WorkQueue,
    path: PathBuf,
}

impl WorkClaim<'_> {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkClaim<'_> {
    fn drop(&mut self) {
        self.queue.finish_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn fifo_order() {
        let queue = WorkQueue::new();
        let _root = queue.seed("/".into());
        queue.push("/a".into());
        queue.push("/b".into());

        assert_eq!(queue.pop_blocking().unwrap().path(), Path::new("/a"));
        assert_eq!(queue.pop_blocking().unwrap().path(), Path::new("/b"));
        assert_eq!(queue.discovered(), 2);
    }

    #[test]
    fn seed_without_children_terminates() {
        let queue = WorkQueue::new();
        let root = queue.seed("/root".into());
        assert!(!queue.is_terminated());
        drop(root);
        assert!(queue.is_terminated());
        assert!(queue.pop_blocking().is_none());
    }

    #[test]
    fn empty_queue_with_active_claim_is_not_terminated() {
        let queue = WorkQueue::new();
        let root = queue.seed("/root".into());
        queue.push("/root/a".into());
        drop(root);

        let claim = queue.pop_blocking().unwrap();
        // Queue empty but a worker is still dispatching.
        assert!(!queue.is_terminated());

        queue.push("/root/a/b".into());
        drop(claim);
        assert!(!queue.is_terminated());

        let last = queue.pop_blocking().unwrap();
        drop(last);
        assert!(queue.is_terminated());
    }

    #[test]
    fn signal_termination_is_idempotent_and_wakes_waiters() {
        let queue = WorkQueue::new();
        let _root = queue.seed("/".into());

        thread::scope(|s| {
            let waiter = s.spawn(|| queue.pop_blocking().is_none());
            thread::sleep(Duration::from_millis(20));
            queue.signal_termination();
            queue.signal_termination();
            assert!(waiter.join().unwrap());
        });
    }

    #[test]
    fn push_wakes_blocked_worker() {
        let queue = WorkQueue::new();
        let root = queue.seed("/".into());

        thread::scope(|s| {
            let waiter = s.spawn(|| {
                let claim = queue.pop_blocking().unwrap();
                claim.path().to_path_buf()
            });
            thread::sleep(Duration::from_millis(20));
            queue.push("/late".into());
            assert_eq!(waiter.join().unwrap(), Path::new("/late"));
        });

        drop(root);
        assert!(queue.is_terminated());
    }

    #[test]
    fn abort_drops_pending_and_terminates() {
        let queue = WorkQueue::new();
        let root = queue.seed("/".into());
        queue.push("/a".into());
        queue.push("/b".into());
        queue.push("/c".into());

        assert_eq!(queue.abort(), 3);
        assert!(queue.pop_blocking().is_none());
        drop(root);
        assert!(queue.is_terminated());
    }

    #[test]
    fn every_path_claimed_exactly_once() {
        let queue = WorkQueue::new();
        let claimed = AtomicUsize::new(0);
        let root = queue.seed("/".into());
        for i in 0..1000 {
            queue.push(format!("/{i}").into());
        }
        drop(root);

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    while let Some(_claim) = queue.pop_blocking() {
                        claimed.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });

        assert_eq!(claimed.load(Ordering::Relaxed), 1000);
        assert!(queue.is_terminated());
    }
}
