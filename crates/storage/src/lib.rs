//! Storage layer for the write coalescer
//!
//! This crate implements a reference single-writer transactional engine:
//! - MemoryStore: bucketed key/value store with serialized write transactions
//! - WriteTransaction: copy-on-write handle passed to update closures
//! - Snapshot: immutable committed state served to readers
//! - Bucket: ordered byte-key map
//!
//! Writers are serialized by a mutex; commit swaps in a new snapshot so
//! readers observe either all of a transaction or none of it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bucket;
pub mod memory;
pub mod snapshot;
pub mod transaction;

pub use bucket::Bucket;
pub use memory::MemoryStore;
pub use snapshot::Snapshot;
pub use transaction::WriteTransaction;
