//! Coalescer: groups independent write operations into shared transactions
//!
//! ## Architecture
//!
//! ```text
//!  callers ──update()──► pending queue (bounded, capacity = limit) ──┐
//!     │                                                              │
//!     └──── Tick ────► coalesce-counter ── Wake::Force ──► coalesce-flusher
//!                                                          (timer or force)
//!                                                                 │
//!                                                  one store transaction per batch
//! ```
//!
//! Callers block in [`Coalescer::update`] until the batch holding their
//! operation resolves. A full queue blocks submitters: nothing is dropped.
//!
//! Because a batch shares one physical transaction, one failing operation
//! rolls back every other operation in the batch. Those operations receive
//! [`Error::Rollback`] and may resubmit; nothing is retried automatically.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info};

use coalesce_core::{CoalescerConfig, Error, Result, Store};

use crate::executor::PendingOperation;
use crate::metrics::{CoalescerMetrics, CoalescerStats};
use crate::scheduler::FlushScheduler;
use crate::trigger::{run_trigger_counter, Tick};

/// Write-transaction coalescer in front of a single-writer [`Store`]
///
/// # Example
///
/// ```ignore
/// use coalesce_engine::Coalescer;
/// use coalesce_storage::MemoryStore;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let store = Arc::new(MemoryStore::new());
/// let coalescer = Coalescer::new(Arc::clone(&store), 10, Duration::from_millis(50))?;
///
/// coalescer.update(|tx| {
///     tx.create_bucket(b"foo")?;
///     Ok(())
/// })?;
/// ```
pub struct Coalescer<S: Store> {
    store: Arc<S>,
    queue: SyncSender<PendingOperation<S::Tx>>,
    /// Operations enqueued and not yet taken by a batch
    queued: Arc<AtomicUsize>,
    ticks: Sender<Tick>,
    limit: usize,
    interval: Duration,
    closed: AtomicBool,
    metrics: Arc<CoalescerMetrics>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: Store> Coalescer<S> {
    /// Create a coalescer and start its background threads.
    ///
    /// The coalescer flushes when `limit` submissions have been counted or
    /// when `interval` has elapsed, whichever comes first.
    ///
    /// # Errors
    ///
    /// - `InvalidLimit` if `limit` is zero
    /// - `InvalidInterval` if `interval` is zero
    /// - `Io` if a background thread cannot be spawned
    ///
    /// No thread is started when validation fails.
    pub fn new(store: Arc<S>, limit: usize, interval: Duration) -> Result<Self> {
        if limit == 0 {
            return Err(Error::InvalidLimit);
        }
        if interval.is_zero() {
            return Err(Error::InvalidInterval);
        }

        let (queue, queue_rx) = mpsc::sync_channel(limit);
        let (ticks, ticks_rx) = mpsc::channel();
        let (wake_tx, wake_rx) = mpsc::sync_channel(1);
        let metrics = Arc::new(CoalescerMetrics::default());
        let queued = Arc::new(AtomicUsize::new(0));

        let scheduler = FlushScheduler::new(
            Arc::clone(&store),
            queue_rx,
            Arc::clone(&queued),
            wake_rx,
            interval,
            limit,
            Arc::clone(&metrics),
        );
        let flusher = thread::Builder::new()
            .name("coalesce-flusher".to_string())
            .spawn(move || scheduler.run())?;

        // If this spawn fails, wake_tx is dropped with the closure and the
        // flusher exits on the disconnect.
        let counter = match thread::Builder::new()
            .name("coalesce-counter".to_string())
            .spawn(move || run_trigger_counter(limit, ticks_rx, wake_tx))
        {
            Ok(handle) => handle,
            Err(e) => {
                let _ = flusher.join();
                return Err(e.into());
            }
        };

        info!(
            target: "coalesce::engine",
            limit,
            interval_ms = interval.as_millis() as u64,
            "Coalescer started"
        );

        Ok(Self {
            store,
            queue,
            queued,
            ticks,
            limit,
            interval,
            closed: AtomicBool::new(false),
            metrics,
            threads: Mutex::new(vec![counter, flusher]),
        })
    }

    /// Create a coalescer from a validated [`CoalescerConfig`].
    pub fn with_config(store: Arc<S>, config: &CoalescerConfig) -> Result<Self> {
        config.validate()?;
        Self::new(store, config.limit, config.interval())
    }

    /// Execute `f` in the context of a coalesced write transaction.
    ///
    /// Blocks until the batch containing `f` has committed or rolled back.
    ///
    /// # Returns
    ///
    /// - `Ok(())` if the batch committed
    /// - `f`'s own error if `f` failed (its batch is rolled back)
    /// - `Err(Error::Rollback)` if another operation in the batch failed
    /// - the store's error if the commit itself failed
    /// - `Err(Error::Closed)` after [`shutdown`](Self::shutdown)
    ///
    /// There is no timeout: a stalled store stalls every waiting caller.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut S::Tx) -> Result<()> + Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }

        let (done, outcome) = mpsc::sync_channel(1);
        let pending = PendingOperation::new(Box::new(f), done);

        // Blocks while the queue is full.
        self.queue.send(pending).map_err(|_| Error::Closed)?;

        // Counted after enqueueing: a flush cycle only takes operations it
        // has seen counted, and a forced flush always finds the operation
        // that tripped it.
        self.queued.fetch_add(1, Ordering::AcqRel);
        let _ = self.ticks.send(Tick::Submitted);

        // A dropped sender means the flusher is gone without answering.
        outcome.recv().unwrap_or(Err(Error::Closed))
    }

    /// Stop accepting work, flush everything already queued, and join the
    /// background threads.
    ///
    /// Idempotent. Also called on drop.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let _ = self.ticks.send(Tick::Shutdown);

        let mut threads = self.threads.lock();

        // Called from inside an operation: the flusher cannot join itself and
        // may be the only reader of a full wake channel, so the threads are
        // left to exit on their own.
        let current = thread::current().id();
        if threads.iter().any(|h| h.thread().id() == current) {
            threads.clear();
            debug!(target: "coalesce::engine", "Shutdown from a coalescer thread, not joining");
            return;
        }

        for handle in threads.drain(..) {
            let name = handle.thread().name().unwrap_or("coalesce").to_string();
            if handle.join().is_err() {
                error!(target: "coalesce::engine", thread = %name, "Background thread panicked");
            }
        }

        info!(target: "coalesce::engine", "Coalescer stopped");
    }

    /// True once [`shutdown`](Self::shutdown) has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Submissions that force a flush; also the pending queue capacity
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Maximum wait between flush cycles
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The store batches are executed against
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Return a snapshot of coalescer metrics.
    pub fn stats(&self) -> CoalescerStats {
        self.metrics.snapshot()
    }
}

impl<S: Store> Drop for Coalescer<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<S: Store> std::fmt::Debug for Coalescer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coalescer")
            .field("limit", &self.limit)
            .field("interval", &self.interval)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}
