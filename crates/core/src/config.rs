//! Coalescer configuration via `coalesce.toml`
//!
//! The coalescer needs exactly two settings: how many submissions force an
//! early flush (`limit`, also the pending queue capacity) and how long the
//! flusher waits otherwise (`interval_ms`). Both must be strictly positive.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Config file name conventionally placed next to the store.
pub const CONFIG_FILE_NAME: &str = "coalesce.toml";

/// Default batch limit.
pub const DEFAULT_LIMIT: usize = 1000;

/// Default flush interval in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 10;

/// Coalescer configuration loaded from `coalesce.toml`.
///
/// # Example
///
/// ```toml
/// # Submissions that force a flush ahead of the timer
/// limit = 1000
///
/// # Maximum time an operation waits before its batch runs
/// interval_ms = 10
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoalescerConfig {
    /// Pending queue capacity and forced-flush threshold.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Flush interval in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

impl CoalescerConfig {
    /// Build a config from a limit and an interval.
    ///
    /// The interval is stored with millisecond precision. A non-zero
    /// interval shorter than 1ms is rounded up to 1ms; very long intervals
    /// saturate at `u64::MAX` milliseconds.
    pub fn new(limit: usize, interval: Duration) -> Self {
        let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        Self {
            limit,
            interval_ms: if interval_ms == 0 && !interval.is_zero() {
                1
            } else {
                interval_ms
            },
        }
    }

    /// Flush interval as a `Duration`.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Check both settings are strictly positive.
    ///
    /// # Errors
    ///
    /// `InvalidLimit` if `limit` is zero, otherwise `InvalidInterval` if
    /// `interval_ms` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(Error::InvalidLimit);
        }
        if self.interval_ms == 0 {
            return Err(Error::InvalidInterval);
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Write coalescer configuration
#
# Number of submissions that forces a flush ahead of the timer.
# Also the capacity of the pending queue: submitters block when it is full.
limit = 1000

# Flush interval in milliseconds. An operation never waits longer than this
# for its batch to start (unless the store itself stalls).
interval_ms = 10
"#
    }

    /// Parse and validate a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the text is not valid TOML for this struct,
    /// or a validation error if a value is zero.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CoalescerConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
