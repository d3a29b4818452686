//! Shared test utilities for the scenario suites.
//!
//! Import via `mod common;` from any test's main.rs.

#![allow(dead_code)]

use std::sync::{Arc, Once};
use std::time::Duration;
use tracing_subscriber::filter::LevelFilter;

pub use coalesce::{
    Coalescer, CoalescerConfig, CoalescerStats, Error, MemoryStore, Result, WriteTransaction,
};

static INIT_TRACING: Once = Once::new();

/// Route coalescer logs to the test harness output.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(LevelFilter::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// In-memory store plus a coalescer in front of it.
pub struct TestCoalescer {
    pub store: Arc<MemoryStore>,
    pub coalescer: Arc<Coalescer<MemoryStore>>,
}

impl TestCoalescer {
    pub fn new(limit: usize, interval: Duration) -> Self {
        init_tracing();
        let store = Arc::new(MemoryStore::new());
        let coalescer = Arc::new(
            Coalescer::new(Arc::clone(&store), limit, interval).expect("valid coalescer settings"),
        );
        Self { store, coalescer }
    }

    pub fn from_config(config: &CoalescerConfig) -> Self {
        init_tracing();
        let store = Arc::new(MemoryStore::new());
        let coalescer = Arc::new(
            Coalescer::with_config(Arc::clone(&store), config).expect("valid coalescer config"),
        );
        Self { store, coalescer }
    }

    pub fn stats(&self) -> CoalescerStats {
        self.coalescer.stats()
    }
}

pub fn encode_u64(n: u64) -> Vec<u8> {
    n.to_be_bytes().to_vec()
}

pub fn decode_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_be_bytes(buf)
}

/// Read a u64 balance from a bucket inside a write transaction.
pub fn balance(tx: &WriteTransaction, bucket: &[u8], key: &[u8]) -> u64 {
    tx.bucket(bucket)
        .and_then(|b| b.get(key))
        .map(decode_u64)
        .unwrap_or(0)
}

/// Read a committed u64 from the store.
pub fn committed_u64(store: &MemoryStore, bucket: &[u8], key: &[u8]) -> u64 {
    store.snapshot().get(bucket, key).map(decode_u64).unwrap_or(0)
}

/// Submit `f` until it lands in a batch that is not rolled back by
/// another caller.
pub fn update_retrying<F>(coalescer: &Coalescer<MemoryStore>, f: F) -> Result<()>
where
    F: Fn(&mut WriteTransaction) -> Result<()> + Send + Sync + Clone + 'static,
{
    loop {
        match coalescer.update(f.clone()) {
            Err(Error::Rollback) => continue,
            other => return other,
        }
    }
}
