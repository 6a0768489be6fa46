//! Mutual exclusion consumed by the locking set variants.
//!
//! The sets only rely on the acquire/release contract; which algorithm
//! provides it (test-and-set, queue locks, an OS mutex) is a separate
//! concern and can be injected per set.

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_utils::Backoff;

/// Exclusion contract: between `acquire` returning and the matching
/// `release`, no other thread's `acquire` returns.
///
/// `release` must only be called by the thread that currently holds the
/// lock. No fairness is promised; a contended `acquire` may starve.
pub trait RawExclusion: Default + Send + Sync {
    fn acquire(&self);
    fn release(&self);
}

/// Test-and-set spin lock with exponential backoff.
///
/// The default lock for [`FineSet`](crate::FineSet),
/// [`OptimisticSet`](crate::OptimisticSet) and [`LazySet`](crate::LazySet).
/// Critical sections in the sets are a handful of pointer operations, so
/// spinning beats parking.
#[derive(Debug, Default)]
pub struct SpinExclusion {
    locked: AtomicBool,
}

impl RawExclusion for SpinExclusion {
    fn acquire(&self) {
        let backoff = Backoff::new();
        loop {
            if self
                .locked
                .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return;
            }
            // Spin on the read-only load until the lock looks free.
            while self.locked.load(Ordering::Relaxed) {
                backoff.snooze();
            }
        }
    }

    fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }
}
