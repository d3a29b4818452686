//! Core trait for the transactional engine behind the coalescer
//!
//! The coalescer never touches storage directly. It only needs an engine
//! that can run a closure inside one write transaction, so that any
//! single-writer store can be swapped in without changing upper layers.

use crate::error::Result;

/// Single-writer transactional store
///
/// Thread safety: `update` may be called from any thread, but the store must
/// serialize write transactions internally so at most one is open at a time.
///
/// # Contract
///
/// `update` opens one write transaction, hands `f` a live handle to it, and:
/// - commits if `f` returns `Ok(())`, then returns the commit result
/// - rolls back if `f` returns an error, and returns that same error
///
/// A committed transaction's effects become visible all at once; a rolled
/// back transaction leaves no trace.
///
/// # Example
///
/// ```ignore
/// store.update(|tx| {
///     tx.create_bucket(b"widgets")?;
///     Ok(())
/// })?;
/// ```
pub trait Store: Send + Sync + 'static {
    /// Handle passed to closures while a write transaction is open
    type Tx;

    /// Run `f` inside one write transaction with all-or-nothing semantics
    ///
    /// # Errors
    ///
    /// Returns the error produced by `f`, or an engine error if the
    /// transaction could not be opened or committed.
    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self::Tx) -> Result<()>;
}
