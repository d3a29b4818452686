//! Core types and traits for the write coalescer
//!
//! This crate defines the pieces shared by every other layer:
//! - Error: the single error taxonomy delivered to callers
//! - CoalescerConfig: batch limit and flush interval, loadable from `coalesce.toml`
//! - Store: the transactional engine contract the coalescer sits in front of

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod traits;

pub use config::{CoalescerConfig, CONFIG_FILE_NAME, DEFAULT_INTERVAL_MS, DEFAULT_LIMIT};
pub use error::{Error, Result};
pub use traits::Store;
