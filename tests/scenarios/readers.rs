//! Readers running alongside coalesced writers.
//!
//! Every operation in these tests writes the same pair of keys with the
//! same value. A committed snapshot where the two differ would mean a
//! batch was published half applied.

use crate::common::*;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const PAIR: &[u8] = b"pair";

#[test]
fn snapshots_never_show_half_a_batch() {
    let t = TestCoalescer::new(8, Duration::from_millis(1));
    let stop = Arc::new(AtomicBool::new(false));
    let observed = Arc::new(AtomicU64::new(0));

    let reader = {
        let store = Arc::clone(&t.store);
        let stop = Arc::clone(&stop);
        let observed = Arc::clone(&observed);
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                let snap = store.snapshot();
                let left = snap.get(PAIR, b"left").map(decode_u64);
                let right = snap.get(PAIR, b"right").map(decode_u64);
                assert_eq!(left, right, "torn snapshot at version {}", snap.version());
                observed.fetch_add(1, Ordering::Relaxed);
            }
        })
    };

    let writers: Vec<_> = (0..4u64)
        .map(|w| {
            let coalescer = Arc::clone(&t.coalescer);
            thread::spawn(move || {
                for i in 0..50u64 {
                    let value = w * 1000 + i;
                    coalescer
                        .update(move |tx| {
                            let bucket = tx.create_bucket_if_not_exists(PAIR)?;
                            bucket.put("left", encode_u64(value))?;
                            bucket.put("right", encode_u64(value))
                        })
                        .unwrap();
                }
            })
        })
        .collect();

    for w in writers {
        w.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    reader.join().unwrap();

    assert!(observed.load(Ordering::Relaxed) > 0);
    assert_eq!(t.stats().operations_committed, 200);
}

/// A rolled-back batch leaves the previously committed snapshot in place.
#[test]
fn rolled_back_batch_is_invisible() {
    let t = TestCoalescer::new(100, Duration::from_millis(5));
    t.coalescer
        .update(|tx| tx.create_bucket(PAIR)?.put("left", encode_u64(1)))
        .unwrap();
    let before = t.store.snapshot();

    let result = t.coalescer.update(|tx| {
        tx.bucket_mut(PAIR)?.put("left", encode_u64(2))?;
        tx.create_bucket(b"scratch")?;
        Err(Error::application("abandon"))
    });
    assert!(matches!(result, Err(Error::Application(_))));

    let after = t.store.snapshot();
    assert_eq!(after.version(), before.version());
    assert_eq!(after.get(PAIR, b"left").map(decode_u64), Some(1));
    assert!(after.bucket(b"scratch").is_none());
}
