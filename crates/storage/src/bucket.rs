//! Bucket: ordered byte-key map inside a store
//!
//! Keys are kept in a `BTreeMap` so iteration is always in byte order.

use std::collections::BTreeMap;

use coalesce_core::{Error, Result};

/// A named collection of key/value pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bucket {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl Bucket {
    /// Create an empty bucket
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value stored under `key`
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns `KeyRequired` if `key` is empty.
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Result<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::KeyRequired);
        }
        self.entries.insert(key, value.into());
        Ok(())
    }

    /// Remove `key`, returning its previous value if it existed
    pub fn delete(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.remove(key)
    }

    /// Number of keys in the bucket
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the bucket holds no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}
