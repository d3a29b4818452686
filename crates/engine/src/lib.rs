//! Coalescing engine
//!
//! This crate groups many independently submitted write operations into a
//! single transaction against a [`Store`](coalesce_core::Store):
//! - Coalescer: submission gate, construction and shutdown
//! - Trigger counter: forces a flush once `limit` submissions accumulate
//! - Flush scheduler: waits for the interval or a forced flush, one batch at a time
//! - Batch executor: runs a drained batch in one transaction and reports outcomes
//!
//! One failing operation rolls back every operation batched with it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coalescer;
mod executor;
pub mod metrics;
mod scheduler;
mod trigger;

pub use coalescer::Coalescer;
pub use metrics::CoalescerStats;
