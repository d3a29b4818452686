//! Trigger counter: forces a flush once enough submissions accumulate
//!
//! The count is owned by a single thread that receives one `Tick` per
//! submission, so it is never shared and needs no lock. When the count
//! reaches the limit the thread sends one `Wake::Force` to the flusher and
//! starts counting from zero again.

use std::sync::mpsc::{Receiver, SyncSender};

use tracing::trace;

/// Message from the submission gate to the trigger counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tick {
    /// One operation was enqueued
    Submitted,
    /// The coalescer is shutting down
    Shutdown,
}

/// Message from the trigger counter to the flush scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wake {
    /// Flush now, the limit was reached
    Force,
    /// Run a final flush and stop
    Shutdown,
}

/// Submissions seen since the last forced flush
#[derive(Debug)]
pub(crate) struct TriggerState {
    count: usize,
    limit: usize,
}

impl TriggerState {
    pub(crate) fn new(limit: usize) -> Self {
        Self { count: 0, limit }
    }

    /// Count one submission. Returns true when a flush should be forced;
    /// the count is reset at that point.
    pub(crate) fn observe(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.limit {
            self.count = 0;
            return true;
        }
        false
    }

    #[cfg(test)]
    pub(crate) fn count(&self) -> usize {
        self.count
    }
}

/// Body of the `coalesce-counter` thread.
///
/// Exits on `Tick::Shutdown` (after forwarding it), when every tick sender
/// is gone, or when the flusher has stopped listening.
pub(crate) fn run_trigger_counter(limit: usize, ticks: Receiver<Tick>, wake: SyncSender<Wake>) {
    let mut state = TriggerState::new(limit);

    while let Ok(tick) = ticks.recv() {
        match tick {
            Tick::Submitted => {
                if state.observe() {
                    trace!(target: "coalesce::flush", limit, "Limit reached, forcing flush");
                    if wake.send(Wake::Force).is_err() {
                        return;
                    }
                }
            }
            Tick::Shutdown => {
                let _ = wake.send(Wake::Shutdown);
                return;
            }
        }
    }
}
