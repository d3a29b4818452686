//! Ledger scenarios: transfers between accounts under contention.
//!
//! A transfer reads both balances and writes both back inside one
//! operation, so any lost update or partially applied batch shows up as a
//! broken total.

use crate::common::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const ACCOUNTS: &[u8] = b"accounts";

fn seed(coalescer: &Coalescer<MemoryStore>, a: u64, b: u64) {
    coalescer
        .update(move |tx| {
            let bucket = tx.create_bucket(ACCOUNTS)?;
            bucket.put("a", encode_u64(a))?;
            bucket.put("b", encode_u64(b))
        })
        .unwrap();
}

/// Move `amount` from account a to account b, failing the operation (and
/// so its batch) when a cannot cover it.
fn transfer(amount: u64) -> impl Fn(&mut WriteTransaction) -> Result<()> + Send + Sync + Clone {
    move |tx| {
        let from = balance(tx, ACCOUNTS, b"a");
        let to = balance(tx, ACCOUNTS, b"b");
        if from < amount {
            return Err(Error::application("insufficient funds"));
        }
        let bucket = tx.bucket_mut(ACCOUNTS)?;
        bucket.put("a", encode_u64(from - amount))?;
        bucket.put("b", encode_u64(to + amount))
    }
}

/// 4 threads x 25 transfers of 10 drain a=1000 exactly into b.
#[test]
fn concurrent_transfers_conserve_total() {
    let t = TestCoalescer::new(8, Duration::from_millis(2));
    seed(&t.coalescer, 1000, 1000);

    let threads = 4;
    let per_thread = 25;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let coalescer = Arc::clone(&t.coalescer);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..per_thread {
                    update_retrying(&coalescer, transfer(10)).unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(committed_u64(&t.store, ACCOUNTS, b"a"), 0);
    assert_eq!(committed_u64(&t.store, ACCOUNTS, b"b"), 2000);
    // Seed plus 100 transfers
    assert_eq!(t.stats().operations_committed, 101);
}

/// More transfers than funds: exactly the affordable ones commit, the rest
/// fail with their own error, and the total never changes.
#[test]
fn overdraft_attempts_fail_alone() {
    let t = TestCoalescer::new(4, Duration::from_millis(5));
    seed(&t.coalescer, 50, 0);

    let succeeded = Arc::new(AtomicU64::new(0));
    let refused = Arc::new(AtomicU64::new(0));
    let barrier = Arc::new(Barrier::new(10));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let coalescer = Arc::clone(&t.coalescer);
            let succeeded = Arc::clone(&succeeded);
            let refused = Arc::clone(&refused);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                match update_retrying(&coalescer, transfer(10)) {
                    Ok(()) => succeeded.fetch_add(1, Ordering::Relaxed),
                    Err(Error::Application(msg)) => {
                        assert_eq!(msg, "insufficient funds");
                        refused.fetch_add(1, Ordering::Relaxed)
                    }
                    Err(e) => panic!("unexpected error: {}", e),
                };
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(succeeded.load(Ordering::Relaxed), 5);
    assert_eq!(refused.load(Ordering::Relaxed), 5);
    assert_eq!(committed_u64(&t.store, ACCOUNTS, b"a"), 0);
    assert_eq!(committed_u64(&t.store, ACCOUNTS, b"b"), 50);
    assert_eq!(t.stats().operations_failed, 5);
}

/// Writes from one caller are visible to that caller's next operation.
#[test]
fn sequential_updates_from_one_caller_see_each_other() {
    let t = TestCoalescer::new(100, Duration::from_millis(2));
    seed(&t.coalescer, 30, 0);

    for _ in 0..3 {
        t.coalescer.update(transfer(10)).unwrap();
    }

    let result = t.coalescer.update(transfer(10));
    assert!(matches!(result, Err(Error::Application(_))));
    assert_eq!(committed_u64(&t.store, ACCOUNTS, b"b"), 30);
}
