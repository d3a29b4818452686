//! Coalescer metrics
//!
//! Counters are updated by the background loops and read by `stats()`.
//! All counters use Relaxed ordering: they are observational only and do
//! not synchronize any other memory.

use std::sync::atomic::{AtomicU64, Ordering};

/// Why a flush cycle started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlushReason {
    /// The trigger counter reached the limit
    Forced,
    /// The interval elapsed
    Interval,
    /// Final flush during shutdown
    Shutdown,
}

impl FlushReason {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            FlushReason::Forced => "forced",
            FlushReason::Interval => "interval",
            FlushReason::Shutdown => "shutdown",
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct CoalescerMetrics {
    forced_flushes: AtomicU64,
    interval_flushes: AtomicU64,
    idle_wakeups: AtomicU64,
    batches_committed: AtomicU64,
    batches_failed: AtomicU64,
    operations_committed: AtomicU64,
    operations_failed: AtomicU64,
    operations_rolled_back: AtomicU64,
}

impl CoalescerMetrics {
    pub(crate) fn record_wakeup(&self, reason: FlushReason) {
        match reason {
            FlushReason::Forced => self.forced_flushes.fetch_add(1, Ordering::Relaxed),
            FlushReason::Interval => self.interval_flushes.fetch_add(1, Ordering::Relaxed),
            FlushReason::Shutdown => 0,
        };
    }

    pub(crate) fn record_idle(&self) {
        self.idle_wakeups.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished batch.
    ///
    /// `pending` is the number of operations that ran cleanly and then
    /// received the transaction outcome; `failed` is 1 if one operation
    /// aborted the batch with its own error.
    pub(crate) fn record_batch(&self, committed: bool, pending: usize, failed: usize) {
        if committed {
            self.batches_committed.fetch_add(1, Ordering::Relaxed);
            self.operations_committed
                .fetch_add(pending as u64, Ordering::Relaxed);
        } else {
            self.batches_failed.fetch_add(1, Ordering::Relaxed);
            self.operations_rolled_back
                .fetch_add(pending as u64, Ordering::Relaxed);
        }
        self.operations_failed
            .fetch_add(failed as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CoalescerStats {
        CoalescerStats {
            forced_flushes: self.forced_flushes.load(Ordering::Relaxed),
            interval_flushes: self.interval_flushes.load(Ordering::Relaxed),
            idle_wakeups: self.idle_wakeups.load(Ordering::Relaxed),
            batches_committed: self.batches_committed.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            operations_committed: self.operations_committed.load(Ordering::Relaxed),
            operations_failed: self.operations_failed.load(Ordering::Relaxed),
            operations_rolled_back: self.operations_rolled_back.load(Ordering::Relaxed),
        }
    }
}

/// Coalescer metrics snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoalescerStats {
    /// Flush cycles started because the submission count reached the limit.
    pub forced_flushes: u64,
    /// Flush cycles started because the interval elapsed.
    pub interval_flushes: u64,
    /// Wakeups that found the pending queue empty and opened no transaction.
    pub idle_wakeups: u64,
    /// Batches whose transaction committed.
    pub batches_committed: u64,
    /// Batches whose transaction rolled back or failed to commit.
    pub batches_failed: u64,
    /// Operations that received `Ok(())`.
    pub operations_committed: u64,
    /// Operations that received their own error.
    pub operations_failed: u64,
    /// Operations that ran cleanly but received the batch's failure.
    pub operations_rolled_back: u64,
}

impl CoalescerStats {
    /// Total batches executed against the store.
    pub fn batches(&self) -> u64 {
        self.batches_committed + self.batches_failed
    }
}
