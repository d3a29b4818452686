//! WriteTransaction: handle passed to `Store::update` closures
//!
//! A transaction starts from the latest committed bucket map and mutates a
//! private copy of it. Nothing is visible to readers until the store
//! publishes the copy on commit; dropping the transaction discards it.

use std::sync::Arc;

use coalesce_core::{Error, Result};

use crate::bucket::Bucket;
use crate::snapshot::Buckets;

/// Live write transaction over a `MemoryStore`
#[derive(Debug)]
pub struct WriteTransaction {
    buckets: Buckets,
}

fn display_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

impl WriteTransaction {
    pub(crate) fn new(buckets: Buckets) -> Self {
        Self { buckets }
    }

    pub(crate) fn into_buckets(self) -> Buckets {
        self.buckets
    }

    /// Create a new bucket
    ///
    /// # Errors
    ///
    /// `BucketNameRequired` if `name` is empty, `BucketExists` if a bucket
    /// with this name is already present.
    pub fn create_bucket(&mut self, name: &[u8]) -> Result<&mut Bucket> {
        if name.is_empty() {
            return Err(Error::BucketNameRequired);
        }
        if self.buckets.contains_key(name) {
            return Err(Error::BucketExists(display_name(name)));
        }
        let bucket = self
            .buckets
            .entry(name.to_vec())
            .or_insert_with(|| Arc::new(Bucket::new()));
        Ok(Arc::make_mut(bucket))
    }

    /// Create a bucket unless it already exists, returning it either way
    pub fn create_bucket_if_not_exists(&mut self, name: &[u8]) -> Result<&mut Bucket> {
        if name.is_empty() {
            return Err(Error::BucketNameRequired);
        }
        let bucket = self
            .buckets
            .entry(name.to_vec())
            .or_insert_with(|| Arc::new(Bucket::new()));
        Ok(Arc::make_mut(bucket))
    }

    /// Remove a bucket and all of its keys
    ///
    /// # Errors
    ///
    /// `BucketNotFound` if no bucket has this name.
    pub fn delete_bucket(&mut self, name: &[u8]) -> Result<()> {
        self.buckets
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::BucketNotFound(display_name(name)))
    }

    /// Read-only access to a bucket, including uncommitted changes
    pub fn bucket(&self, name: &[u8]) -> Option<&Bucket> {
        self.buckets.get(name).map(|b| b.as_ref())
    }

    /// Mutable access to an existing bucket
    ///
    /// The first mutable access clones the bucket if the committed snapshot
    /// still shares it.
    ///
    /// # Errors
    ///
    /// `BucketNotFound` if no bucket has this name.
    pub fn bucket_mut(&mut self, name: &[u8]) -> Result<&mut Bucket> {
        self.buckets
            .get_mut(name)
            .map(Arc::make_mut)
            .ok_or_else(|| Error::BucketNotFound(display_name(name)))
    }

    /// Bucket names in byte order
    pub fn bucket_names(&self) -> impl Iterator<Item = &[u8]> {
        self.buckets.keys().map(Vec::as_slice)
    }
}
