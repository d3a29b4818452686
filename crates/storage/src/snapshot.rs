//! Snapshot: immutable committed state of a MemoryStore
//!
//! Each commit publishes a new `Snapshot`; readers hold an `Arc` to the one
//! that was current when they started, so a concurrent commit never changes
//! what they see.
//!
//! Buckets are `Arc`-shared between consecutive snapshots. A write transaction
//! clones only the buckets it touches (`Arc::make_mut`), so publishing a new
//! snapshot costs O(buckets) plus the size of the modified buckets.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::bucket::Bucket;

pub(crate) type Buckets = BTreeMap<Vec<u8>, Arc<Bucket>>;

/// Point-in-time view of every bucket in the store
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Number of write transactions committed before this snapshot
    version: u64,
    buckets: Buckets,
}

impl Snapshot {
    pub(crate) fn new(version: u64, buckets: Buckets) -> Self {
        Self { version, buckets }
    }

    pub(crate) fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    /// Commit version that produced this snapshot (0 for an empty store)
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Look up a bucket by name
    pub fn bucket(&self, name: &[u8]) -> Option<&Bucket> {
        self.buckets.get(name).map(|b| b.as_ref())
    }

    /// Convenience lookup of a single key
    pub fn get(&self, bucket: &[u8], key: &[u8]) -> Option<&[u8]> {
        self.bucket(bucket).and_then(|b| b.get(key))
    }

    /// Bucket names in byte order
    pub fn bucket_names(&self) -> impl Iterator<Item = &[u8]> {
        self.buckets.keys().map(Vec::as_slice)
    }
}
