//! Sequential contract tests: what every member of the family must do
//! regardless of its synchronization strategy.

use std::sync::Arc;
use std::thread;

use crate::set::ConcurrentSet;

/// Basic add, contains, remove, and duplicate rejection.
pub fn test_basic_operations<S>(set: &S)
where
    S: ConcurrentSet<i64>,
{
    assert!(set.add(20));
    assert!(set.add(5));
    assert!(set.add(12));
    assert!(set.add(17));
    assert!(set.add(1));

    // Duplicates are rejected.
    assert!(!set.add(12));
    assert!(!set.add(20));

    assert!(set.contains(&1));
    assert!(set.contains(&5));
    assert!(set.contains(&12));
    assert!(set.contains(&17));
    assert!(set.contains(&20));
    assert!(!set.contains(&2));
    assert!(!set.contains(&99));

    assert!(set.remove(&12));
    assert!(!set.contains(&12));
    assert!(!set.remove(&12));
    assert!(!set.remove(&99));

    assert!(set.contains(&1));
    assert!(set.contains(&5));
    assert!(set.contains(&17));
    assert!(set.contains(&20));
}

/// Insert a range, delete the even half, verify both halves.
pub fn test_sequential_operations<S>()
where
    S: ConcurrentSet<i64> + Default,
{
    let set = S::default();

    for i in 0..100 {
        assert!(set.add(i));
    }
    for i in 0..100 {
        assert!(set.contains(&i), "missing key {}", i);
    }

    for i in (0..100).step_by(2) {
        assert!(set.remove(&i));
    }
    for i in (0..100).step_by(2) {
        assert!(!set.contains(&i), "key {} survived removal", i);
    }
    for i in (1..100).step_by(2) {
        assert!(set.contains(&i), "key {} lost", i);
    }
}

/// A snapshot must come back sorted and without duplicates, whatever the
/// insertion order was.
pub fn test_snapshot_sorted_and_unique<S>()
where
    S: ConcurrentSet<i64> + Default,
{
    let set = S::default();
    for v in [42, 7, 99, 1, 56, 23, 88, 3] {
        assert!(set.add(v));
    }
    assert_eq!(set.to_vec(), vec![1, 3, 7, 23, 42, 56, 88, 99]);
}

/// len/is_empty track adds, duplicate adds, removes, and missed removes.
pub fn test_len_operations<S>(set: &S)
where
    S: ConcurrentSet<i64>,
{
    assert_eq!(set.len(), 0);
    assert!(set.is_empty());

    set.add(10);
    assert_eq!(set.len(), 1);
    set.add(20);
    assert_eq!(set.len(), 2);
    set.add(10);
    assert_eq!(set.len(), 2);

    set.remove(&10);
    assert_eq!(set.len(), 1);
    set.remove(&20);
    assert_eq!(set.len(), 0);
    set.remove(&30);
    assert_eq!(set.len(), 0);
    assert!(set.is_empty());
}

/// Removing everything and re-adding must behave like a fresh set.
pub fn test_remove_all_then_reuse<S>()
where
    S: ConcurrentSet<i64> + Default,
{
    let set = S::default();
    for i in 0..50 {
        assert!(set.add(i));
    }
    for i in 0..50 {
        assert!(set.remove(&i));
    }
    assert!(set.is_empty());

    for i in 0..50 {
        assert!(set.add(i), "re-add of {} rejected", i);
    }
    assert_eq!(set.len(), 50);
}

/// Concurrent adds over disjoint ranges: nothing may be lost.
pub fn test_concurrent_adds<S>()
where
    S: ConcurrentSet<i64> + Default + Send + Sync + 'static,
{
    let set = Arc::new(S::default());
    let num_threads = 4;
    let items_per_thread = 250;

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let set = Arc::clone(&set);
            thread::spawn(move || {
                for i in 0..items_per_thread {
                    let key = (thread_id * items_per_thread + i) as i64;
                    assert!(set.add(key));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for i in 0..(num_threads * items_per_thread) as i64 {
        assert!(set.contains(&i), "missing key {}", i);
    }
    assert_eq!(set.len(), num_threads * items_per_thread);
}

/// All threads add the same range; duplicates must be rejected so exactly
/// one copy of each key survives.
pub fn test_high_contention_duplicates<S>()
where
    S: ConcurrentSet<i64> + Default + Send + Sync + 'static,
{
    let set = Arc::new(S::default());
    let num_threads = 8;
    let range = 100;

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let set = Arc::clone(&set);
            thread::spawn(move || (0..range).filter(|v| set.add(*v)).count())
        })
        .collect();

    let wins: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(wins as i64, range, "each key must be added exactly once");
    assert_eq!(set.len() as i64, range);
    for v in 0..range {
        assert!(set.contains(&v), "missing key {}", v);
    }
}
