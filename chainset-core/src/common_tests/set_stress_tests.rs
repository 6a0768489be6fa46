//! Stress tests: correctness of the whole family under real contention.
//!
//! Every body here is deterministic in its operation mix (randomized mixes
//! live with the integration tests, where dev-dependencies apply), so a
//! failure reproduces.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use crate::set::ConcurrentSet;

/// Disjoint-range oracle: every thread owns its own key range and runs a
/// fixed add/remove mix over it, so the exact final state is computable
/// per thread and checked key by key.
pub fn test_disjoint_range_oracle<S>()
where
    S: ConcurrentSet<i64> + Default + Send + Sync + 'static,
{
    let set = Arc::new(S::default());
    let num_threads = 8;
    let keys_per_thread = 400i64;

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let set = Arc::clone(&set);
            thread::spawn(move || {
                let base = t as i64 * keys_per_thread;
                for i in 0..keys_per_thread {
                    assert!(set.add(base + i));
                }
                // Remove every third key, then re-add every ninth.
                for i in (0..keys_per_thread).step_by(3) {
                    assert!(set.remove(&(base + i)));
                }
                for i in (0..keys_per_thread).step_by(9) {
                    assert!(set.add(base + i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for t in 0..num_threads as i64 {
        let base = t * keys_per_thread;
        for i in 0..keys_per_thread {
            let expected = i % 3 != 0 || i % 9 == 0;
            assert_eq!(set.contains(&(base + i)), expected, "key {}", base + i);
        }
    }
}

/// Concurrent remove of one value: exactly one thread wins.
pub fn test_concurrent_remove_same_value<S>()
where
    S: ConcurrentSet<i64> + Default + Send + Sync + 'static,
{
    let set = Arc::new(S::default());
    let num_threads = 32;
    let test_value = 42i64;

    set.add(test_value);

    let wins = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let set = Arc::clone(&set);
            let wins = Arc::clone(&wins);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                if set.remove(&test_value) {
                    wins.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(wins.load(Ordering::Relaxed), 1);
    assert!(!set.contains(&test_value));
}

/// Concurrent add of one value: exactly one thread wins.
pub fn test_concurrent_add_same_value<S>()
where
    S: ConcurrentSet<i64> + Default + Send + Sync + 'static,
{
    let set = Arc::new(S::default());
    let num_threads = 32;
    let test_value = 7i64;

    let wins = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let set = Arc::clone(&set);
            let wins = Arc::clone(&wins);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                if set.add(test_value) {
                    wins.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(wins.load(Ordering::Relaxed), 1);
    assert!(set.contains(&test_value));
    assert_eq!(set.len(), 1);
}

/// All threads alternate add/remove over the same small key range. Per key,
/// the net of *successful* operations must land in {0, 1} and agree with
/// the final membership.
pub fn test_shared_key_alternation<S>()
where
    S: ConcurrentSet<i64> + Default + Send + Sync + 'static,
{
    let set = Arc::new(S::default());
    let num_threads = 8;
    let range = 16usize;
    let rounds = 500;

    let net: Arc<Vec<AtomicI64>> =
        Arc::new((0..range).map(|_| AtomicI64::new(0)).collect());

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let set = Arc::clone(&set);
            let net = Arc::clone(&net);
            thread::spawn(move || {
                for round in 0..rounds {
                    for k in 0..range {
                        let key = k as i64;
                        if (round + t) % 2 == 0 {
                            if set.add(key) {
                                net[k].fetch_add(1, Ordering::Relaxed);
                            }
                        } else if set.remove(&key) {
                            net[k].fetch_sub(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for k in 0..range {
        let n = net[k].load(Ordering::Relaxed);
        assert!(n == 0 || n == 1, "key {}: net successful ops = {}", k, n);
        assert_eq!(set.contains(&(k as i64)), n == 1, "key {}", k);
    }
}

/// Each thread loops add -> contains -> remove -> !contains on its own
/// keys; every step's result is forced, whatever the other threads do.
pub fn test_own_key_visibility<S>()
where
    S: ConcurrentSet<i64> + Default + Send + Sync + 'static,
{
    let set = Arc::new(S::default());
    let num_threads = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    let num_ops = 2_000;

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let set = Arc::clone(&set);
            thread::spawn(move || {
                for i in 0..num_ops {
                    let key = (t * num_ops + i) as i64;
                    assert!(set.add(key), "add of unique key {} failed", key);
                    assert!(set.contains(&key), "key {} invisible after add", key);
                    assert!(set.remove(&key), "remove of own key {} failed", key);
                    assert!(!set.contains(&key), "key {} visible after remove", key);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(set.is_empty());
}

/// Readers run against keys that writers never touch while the writers
/// churn the rest of the range.
pub fn test_reads_during_churn<S>()
where
    S: ConcurrentSet<i64> + Default + Send + Sync + 'static,
{
    let set = Arc::new(S::default());
    let stop = Arc::new(AtomicBool::new(false));

    for v in 0..256i64 {
        set.add(v);
    }

    let writers: Vec<_> = (0..2)
        .map(|_| {
            let set = Arc::clone(&set);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    for v in (0..256i64).step_by(2) {
                        set.remove(&v);
                    }
                    for v in (0..256i64).step_by(2) {
                        set.add(v);
                    }
                }
            })
        })
        .collect();

    for _ in 0..1_000 {
        for v in (1..256i64).step_by(2) {
            // Odd keys are never written.
            assert!(set.contains(&v), "stable key {} lost during churn", v);
        }
    }

    stop.store(true, Ordering::Relaxed);
    for writer in writers {
        writer.join().unwrap();
    }
}
