//! Error types for the write coalescer
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! `Error` is `Clone`: a single transaction outcome is handed to every
//! operation that shared the batch, so the same value is delivered many times.

use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for coalescer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the coalescer and the stores behind it
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The batch limit passed at construction was zero
    #[error("invalid coalescer limit")]
    InvalidLimit,

    /// The flush interval passed at construction was zero
    #[error("invalid coalescer interval")]
    InvalidInterval,

    /// Another operation in the same batch failed and the shared transaction
    /// was rolled back. This operation's own work was discarded with it.
    #[error("rollback")]
    Rollback,

    /// The coalescer has shut down; the operation was not executed or its
    /// outcome can no longer be delivered
    #[error("coalescer is closed")]
    Closed,

    /// The submitted operation panicked while running inside the batch
    #[error("operation panicked: {0}")]
    OperationPanicked(String),

    /// A bucket name was empty
    #[error("bucket name required")]
    BucketNameRequired,

    /// Bucket already exists
    #[error("bucket already exists: {0}")]
    BucketExists(String),

    /// Bucket does not exist
    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    /// A key was empty
    #[error("key required")]
    KeyRequired,

    /// The engine failed to commit the transaction
    #[error("commit failed: {0}")]
    CommitFailed(String),

    /// Failure reported by a caller's own operation
    #[error("{0}")]
    Application(String),

    /// Configuration file could not be parsed or holds invalid values
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error (config files, thread spawn)
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),
}

impl Error {
    /// Build an application error from any message
    pub fn application(msg: impl Into<String>) -> Self {
        Error::Application(msg.into())
    }

    /// True if this is the generic rollback indicator
    pub fn is_rollback(&self) -> bool {
        matches!(self, Error::Rollback)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}
