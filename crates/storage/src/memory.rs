//! MemoryStore: reference single-writer transactional engine
//!
//! This module implements the `Store` trait using:
//! - `parking_lot::Mutex` to serialize write transactions (one open at a time)
//! - `parking_lot::RwLock<Arc<Snapshot>>` for the committed state
//! - `AtomicU64` counters for committed versions and opened transactions
//!
//! # Design Notes
//!
//! - **No durability**: state lives only in memory
//! - **Atomic publish**: commit replaces the snapshot pointer in one step, so
//!   readers see all of a transaction's writes or none of them
//! - **Rollback is free**: an aborted transaction's private copy is dropped

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use coalesce_core::{Result, Store};

use crate::snapshot::Snapshot;
use crate::transaction::WriteTransaction;

/// In-memory bucketed key/value store
///
/// # Example
///
/// ```ignore
/// let store = MemoryStore::new();
/// store.update(|tx| {
///     tx.create_bucket(b"foo")?.put("bar", "baz")?;
///     Ok(())
/// })?;
///
/// let value = store.view(|snap| Ok(snap.get(b"foo", b"bar").map(<[u8]>::to_vec)))?;
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Latest committed state
    committed: RwLock<Arc<Snapshot>>,
    /// Held for the whole lifetime of a write transaction
    writer: Mutex<()>,
    /// Write transactions opened, committed or not
    opened: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Current committed snapshot
    ///
    /// The returned snapshot stays valid and unchanged while later
    /// transactions commit.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.committed.read().clone()
    }

    /// Run a read-only closure against the current committed snapshot
    pub fn view<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Snapshot) -> Result<R>,
    {
        let snapshot = self.snapshot();
        f(&snapshot)
    }

    /// Number of committed write transactions
    pub fn version(&self) -> u64 {
        self.committed.read().version()
    }

    /// Number of write transactions ever opened, including rolled back ones
    pub fn update_count(&self) -> u64 {
        self.opened.load(Ordering::Relaxed)
    }
}

impl Store for MemoryStore {
    type Tx = WriteTransaction;

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut WriteTransaction) -> Result<()>,
    {
        let _writer = self.writer.lock();
        self.opened.fetch_add(1, Ordering::Relaxed);

        let base = self.snapshot();
        let mut tx = WriteTransaction::new(base.buckets().clone());

        if let Err(e) = f(&mut tx) {
            debug!(target: "coalesce::store", version = base.version(), error = %e, "Transaction rolled back");
            return Err(e);
        }

        let version = base.version() + 1;
        *self.committed.write() = Arc::new(Snapshot::new(version, tx.into_buckets()));
        debug!(target: "coalesce::store", version, "Transaction committed");
        Ok(())
    }
}
