//! Flush scheduler: the long-lived loop that starts every batch
//!
//! ```text
//!        ┌──────────── interval elapsed / Wake::Force ───────────┐
//!        │                                                       ▼
//!    ┌───────┐                                             ┌──────────┐
//!    │ Idle  │◄──────── queue empty, or batch done ────────│ Flushing │
//!    └───────┘                                             └──────────┘
//! ```
//!
//! Batches run on this thread only, so the store never sees two coalesced
//! write transactions at once. `Wake::Shutdown` (or the trigger counter
//! going away) runs one final flush of everything still queued and ends the
//! loop; dropping the queue receiver then fails any late submission.
//!
//! A cycle only takes operations that were counted as queued when it
//! started. The gate bumps the count after its enqueue succeeds, and this
//! thread subtracts what each batch took.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use coalesce_core::Store;

use crate::executor::{execute_batch, PendingOperation};
use crate::metrics::{CoalescerMetrics, FlushReason};
use crate::trigger::Wake;

pub(crate) struct FlushScheduler<S: Store> {
    store: Arc<S>,
    queue: Receiver<PendingOperation<S::Tx>>,
    queued: Arc<AtomicUsize>,
    wake: Receiver<Wake>,
    interval: Duration,
    limit: usize,
    metrics: Arc<CoalescerMetrics>,
}

impl<S: Store> FlushScheduler<S> {
    pub(crate) fn new(
        store: Arc<S>,
        queue: Receiver<PendingOperation<S::Tx>>,
        queued: Arc<AtomicUsize>,
        wake: Receiver<Wake>,
        interval: Duration,
        limit: usize,
        metrics: Arc<CoalescerMetrics>,
    ) -> Self {
        Self {
            store,
            queue,
            queued,
            wake,
            interval,
            limit,
            metrics,
        }
    }

    /// Body of the `coalesce-flusher` thread.
    pub(crate) fn run(self) {
        loop {
            let reason = match self.wake.recv_timeout(self.interval) {
                Ok(Wake::Force) => FlushReason::Forced,
                Err(RecvTimeoutError::Timeout) => FlushReason::Interval,
                Ok(Wake::Shutdown) | Err(RecvTimeoutError::Disconnected) => FlushReason::Shutdown,
            };

            if reason == FlushReason::Shutdown {
                while self.flush(reason) {}
                debug!(target: "coalesce::flush", "Flush scheduler stopped");
                return;
            }

            self.flush(reason);
        }
    }

    /// Run one flush cycle. Returns false if the queue was empty and no
    /// transaction was opened.
    fn flush(&self, reason: FlushReason) -> bool {
        self.metrics.record_wakeup(reason);

        // The final flush takes whatever reached the queue, counted or not.
        let bound = match reason {
            FlushReason::Shutdown => self.limit,
            _ => self.queued.load(Ordering::Acquire).min(self.limit),
        };
        if bound == 0 {
            return self.idle(reason);
        }

        let first = match self.queue.try_recv() {
            Ok(op) => op,
            Err(_) => return self.idle(reason),
        };

        let report = execute_batch(
            self.store.as_ref(),
            first,
            &self.queue,
            bound,
            &self.metrics,
        );
        let taken = report.taken;
        let _ = self
            .queued
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_sub(taken))
            });
        debug!(
            target: "coalesce::flush",
            reason = reason.as_str(),
            operations = report.pending + report.failed,
            committed = report.result.is_ok(),
            "Flush cycle finished"
        );
        true
    }

    fn idle(&self, reason: FlushReason) -> bool {
        self.metrics.record_idle();
        trace!(target: "coalesce::flush", reason = reason.as_str(), "Queue empty, skipping flush");
        false
    }
}
