//! Crawl configuration.

use std::num::NonZeroUsize;
use std::thread;

use serde::{Deserialize, Serialize};

use crate::cancel::CancellationToken;
use crate::error::{IndexerError, Result};

/// Upper bound on live fan-out threads when none is configured.
pub const DEFAULT_FAN_OUT_THREADS: usize = 64;

/// Number of pool workers when none is configured: the host's parallelism.
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

fn default_fan_out_threads() -> usize {
    DEFAULT_FAN_OUT_THREADS
}

/// How directories are scheduled onto threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchedulingPolicy {
    /// Fixed pool of workers pulling directories from a shared queue.
    WorkerPool {
        #[serde(default = "default_worker_count")]
        workers: usize,
    },
    /// The calling thread walks the tree depth-first on its own.
    Recursive,
    /// One thread per discovered subdirectory, at most `max_threads` alive.
    /// Beyond the cap subdirectories are walked inline.
    FanOut {
        #[serde(default = "default_fan_out_threads")]
        max_threads: usize,
    },
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self::WorkerPool {
            workers: default_worker_count(),
        }
    }
}

impl SchedulingPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WorkerPool { .. } => "worker_pool",
            Self::Recursive => "recursive",
            Self::FanOut { .. } => "fan_out",
        }
    }

    pub(crate) fn validate(self) -> Result<Self> {
        match self {
            Self::WorkerPool { workers: 0 } => Err(IndexerError::InvalidInput(
                "worker pool needs at least one worker".to_string(),
            )),
            Self::FanOut { max_threads: 0 } => Err(IndexerError::InvalidInput(
                "fan-out needs at least one thread".to_string(),
            )),
            policy => Ok(policy),
        }
    }
}

/// Options for one crawl.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlOptions {
    #[serde(default)]
    pub policy: SchedulingPolicy,
    #[serde(skip)]
    pub cancel: Option<CancellationToken>,
}

impl CrawlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: SchedulingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Switches to a worker pool of `workers` threads. Any other policy set
    /// earlier, `Recursive` or `FanOut`, is replaced.
    pub fn with_workers(self, workers: usize) -> Self {
        self.with_policy(SchedulingPolicy::WorkerPool { workers })
    }

    /// Sets the cancellation token checked between directories.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}
