//! Cancellation tokens for crawl and search operations.
//!
//! A token is a shared flag. Workers check it between directories, so a
//! listing that already started always runs to completion.
//!
//! ## Sparse Checking
//!
//! For tight loops over millions of records, `check_sparse()` only reads the
//! flag every 65,536 iterations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How often long-running loops should check whether execution was cancelled.
/// Using a power of 2 allows efficient modulo via bitwise AND.
pub const CANCEL_CHECK_INTERVAL: usize = 0x10000; // 65,536

/// A cloneable cancellation token. All clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns true once `cancel` was called on any clone.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Returns `Some(())` while still active, `None` once cancelled.
    /// This enables use with the `?` operator for early returns.
    #[inline]
    pub fn check(&self) -> Option<()> {
        if self.is_cancelled() {
            None
        } else {
            Some(())
        }
    }

    /// Sparse cancellation check - only reads the flag every
    /// `CANCEL_CHECK_INTERVAL` iterations.
    #[inline]
    pub fn check_sparse(&self, counter: usize) -> Option<()> {
        if counter & (CANCEL_CHECK_INTERVAL - 1) == 0 {
            self.check()
        } else {
            Some(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_token_is_active() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_some());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(token.check().is_none());
    }

    #[test]
    fn sparse_check_only_reads_on_interval() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(token.check_sparse(1).is_some());
        assert!(token.check_sparse(CANCEL_CHECK_INTERVAL).is_none());
        assert!(token.check_sparse(0).is_none());
    }
}
