//! Epoch-based reclamation for the chainset family.
//!
//! [`EpochGuard`] is a zero-sized [`Guard`] backed by crossbeam-epoch's
//! global collector. A set parameterized with it frees unlinked nodes only
//! after every thread has moved past the epoch in which they were removed,
//! so readers standing on a detached node are always safe:
//!
//! ```text
//! LockFreeSet<i64, EpochGuard>
//!     │
//!     └── reclamation through the global epoch collector
//! ```
//!
//! Compared with `chainset_core::DeferredGuard`, which parks every node
//! until the set is dropped, memory here is returned while the set is
//! still live, at the cost of pinning on each operation.

use chainset_core::Guard;
use crossbeam_epoch::{self as epoch, Guard as CrossbeamGuard};

/// Zero-sized guard that defers destruction to the global epoch collector.
///
/// Being stateless, it can sit inside a set without affecting its Send or
/// Sync bounds; all bookkeeping lives in crossbeam's thread-local and
/// global epoch state.
#[derive(Clone, Copy, Default)]
pub struct EpochGuard;

impl EpochGuard {
    pub fn new() -> Self {
        EpochGuard
    }
}

impl Guard for EpochGuard {
    /// Reads pin the calling thread for their whole traversal; nodes
    /// detached meanwhile cannot be reclaimed under the reader's feet.
    type ReadGuard = CrossbeamGuard;

    fn pin() -> Self::ReadGuard {
        epoch::pin()
    }

    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        // Pin, schedule, unpin. The closure runs once every thread has
        // advanced past the pinned epoch.
        let guard = epoch::pin();
        unsafe {
            guard.defer_unchecked(move || {
                dealloc(node);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn dealloc_box<N>(ptr: *mut N) {
        unsafe { drop(Box::from_raw(ptr)) }
    }

    #[test]
    fn defer_schedules_without_blocking() {
        let guard = EpochGuard::new();
        let ptr = Box::into_raw(Box::new(42i32));
        unsafe {
            guard.defer_destroy(ptr, dealloc_box::<i32>);
        }
        // Reclamation is now the collector's problem; nothing to assert
        // beyond not crashing.
    }

    #[test]
    fn pin_nests() {
        let _outer = EpochGuard::pin();
        let _inner = EpochGuard::pin();
    }

    #[test]
    fn many_deferred_nodes() {
        let guard = EpochGuard::new();
        for i in 0..1_000i64 {
            let ptr = Box::into_raw(Box::new(i));
            unsafe {
                guard.defer_destroy(ptr, dealloc_box::<i64>);
            }
        }
    }
}
