//! Coalesce - write-transaction coalescing for single-writer stores
//!
//! Embedded stores that allow one write transaction at a time pay a full
//! commit per write. Coalesce groups independent writes submitted from many
//! threads into shared transactions: a batch is flushed once `limit`
//! submissions have accumulated or `interval` has elapsed, whichever comes
//! first.
//!
//! # Quick Start
//!
//! ```ignore
//! use coalesce::{Coalescer, MemoryStore};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let store = Arc::new(MemoryStore::new());
//! let coalescer = Coalescer::new(Arc::clone(&store), 100, Duration::from_millis(10))?;
//!
//! coalescer.update(|tx| {
//!     tx.create_bucket_if_not_exists(b"widgets")?.put("bolt", "42")
//! })?;
//! ```
//!
//! # Batch semantics
//!
//! Every operation in a batch shares one physical transaction. If one
//! operation fails, it receives its own error, every operation before it in
//! the batch receives [`Error::Rollback`], and nothing in the batch is
//! committed. Callers that see `Rollback` may resubmit.
//!
//! # Crates
//!
//! - `coalesce-core`: errors, configuration, the [`Store`] trait
//! - `coalesce-storage`: [`MemoryStore`], an in-memory bucketed store
//! - `coalesce-engine`: the [`Coalescer`] itself

pub use coalesce_core::{
    CoalescerConfig, Error, Result, Store, CONFIG_FILE_NAME, DEFAULT_INTERVAL_MS, DEFAULT_LIMIT,
};
pub use coalesce_engine::{Coalescer, CoalescerStats};
pub use coalesce_storage::{Bucket, MemoryStore, Snapshot, WriteTransaction};
