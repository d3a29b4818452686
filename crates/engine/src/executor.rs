//! Batch executor: runs queued operations inside one store transaction
//!
//! ## Outcome delivery
//!
//! ```text
//! op1 Ok  ─┐
//! op2 Ok  ─┼─ pending commit ──► receive the transaction result
//! op3 Err ─┘── receives its own error immediately, aborts the batch
//! op4     ──── never dequeued, waits for the next cycle
//! ```
//!
//! Every operation that ran cleanly is told the final outcome of the shared
//! transaction: `Ok(())` on commit, `Error::Rollback` if another operation
//! aborted it, or the store's own error if the commit failed.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{Receiver, SyncSender};

use tracing::{debug, error, warn};

use coalesce_core::{Error, Result, Store};

use crate::metrics::CoalescerMetrics;

/// A caller's unit of work, run against a live write transaction
pub(crate) type Operation<T> = Box<dyn FnOnce(&mut T) -> Result<()> + Send>;

/// Queued operation plus the one-shot channel its caller is blocked on
pub(crate) struct PendingOperation<T> {
    operation: Operation<T>,
    done: SyncSender<Result<()>>,
}

impl<T> PendingOperation<T> {
    pub(crate) fn new(operation: Operation<T>, done: SyncSender<Result<()>>) -> Self {
        Self { operation, done }
    }

    fn complete(self, result: Result<()>) {
        // The caller may be gone; nothing to do then.
        let _ = self.done.send(result);
    }
}

/// Outcome of one batch, for logging and metrics
#[derive(Debug)]
pub(crate) struct BatchReport {
    /// Operations taken off the queue, whatever their outcome
    pub(crate) taken: usize,
    /// Operations that ran cleanly and were given the transaction result
    pub(crate) pending: usize,
    /// Operations that aborted the batch with their own error (0 or 1)
    pub(crate) failed: usize,
    pub(crate) result: Result<()>,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "(non-string panic)".to_string())
}

/// Invoke one operation, turning a panic into its own error.
fn run_operation<T>(operation: Operation<T>, tx: &mut T) -> Result<()> {
    match panic::catch_unwind(AssertUnwindSafe(|| operation(tx))) {
        Ok(result) => result,
        Err(payload) => {
            let msg = panic_message(payload.as_ref());
            error!(target: "coalesce::flush", panic = %msg, "Operation panicked inside batch");
            Err(Error::OperationPanicked(msg))
        }
    }
}

/// Execute `first` and up to `max_batch - 1` further queued operations in a
/// single store transaction.
///
/// The caller sets `max_batch` to what was queued when the flush cycle
/// started, so submissions arriving while the transaction is open wait for
/// the next cycle even though the queue already holds them.
///
/// On the first operation error the error is delivered to that operation
/// alone and the transaction is aborted with `Error::Rollback`, which every
/// earlier operation then receives.
pub(crate) fn execute_batch<S: Store>(
    store: &S,
    first: PendingOperation<S::Tx>,
    queue: &Receiver<PendingOperation<S::Tx>>,
    max_batch: usize,
    metrics: &CoalescerMetrics,
) -> BatchReport {
    let mut first = Some(first);
    let mut pending: Vec<SyncSender<Result<()>>> = Vec::new();
    let mut failed = 0;
    let mut taken = 0;

    let result = store.update(|tx| {
        loop {
            let next = match first.take() {
                Some(op) => op,
                None if taken >= max_batch => return Ok(()),
                None => match queue.try_recv() {
                    Ok(op) => op,
                    Err(_) => return Ok(()),
                },
            };
            taken += 1;

            let PendingOperation { operation, done } = next;
            match run_operation(operation, tx) {
                Ok(()) => pending.push(done),
                Err(e) => {
                    failed = 1;
                    let _ = done.send(Err(e));
                    return Err(Error::Rollback);
                }
            }
        }
    });

    // Recorded before anyone is woken, so a caller that returns from
    // `update` already sees its batch in the stats.
    metrics.record_batch(result.is_ok(), pending.len(), failed);

    match &result {
        Ok(()) => {
            debug!(target: "coalesce::flush", operations = pending.len(), "Batch committed")
        }
        Err(Error::Rollback) if failed > 0 => warn!(
            target: "coalesce::flush",
            rolled_back = pending.len(),
            "Batch rolled back by failing operation"
        ),
        Err(e) => warn!(
            target: "coalesce::flush",
            operations = pending.len(),
            error = %e,
            "Batch failed in store"
        ),
    }

    // The store failed before running the closure at all.
    if let Some(op) = first.take() {
        taken += 1;
        op.complete(result.clone());
    }

    for done in &pending {
        let _ = done.send(result.clone());
    }

    BatchReport {
        taken,
        pending: pending.len(),
        failed,
        result,
    }
}
