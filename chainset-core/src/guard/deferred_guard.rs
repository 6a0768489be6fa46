//! Deferred destruction for tests: nothing is freed until the guard drops.

use std::sync::Mutex;

#[cfg(debug_assertions)]
use std::collections::HashSet;

use super::Guard;

/// Defers every destruction until the guard itself is dropped.
///
/// A set stores one `DeferredGuard` for its whole lifetime, so every node
/// it ever unlinks stays valid until the set is gone. That makes it the
/// simplest guard that satisfies the reclamation contract, at the cost of
/// unbounded memory growth; use it in tests, not in long-running code.
///
/// In debug builds the guard panics if the same pointer is deferred twice,
/// which catches double-unlink bugs in the set algorithms.
pub struct DeferredGuard {
    pending: Mutex<Vec<Pending>>,
    #[cfg(debug_assertions)]
    seen: Mutex<HashSet<usize>>,
}

struct Pending {
    ptr: *mut (),
    dealloc: unsafe fn(*mut ()),
}

// Pending is only a pointer plus its matching deallocator; the Mutex around
// the Vec provides the synchronization.
unsafe impl Send for Pending {}

impl Default for DeferredGuard {
    fn default() -> Self {
        DeferredGuard {
            pending: Mutex::new(Vec::new()),
            #[cfg(debug_assertions)]
            seen: Mutex::new(HashSet::new()),
        }
    }
}

impl Guard for DeferredGuard {
    /// No per-operation state: protection comes from the stored guard.
    type ReadGuard = ();

    fn pin() -> Self::ReadGuard {}

    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        #[cfg(debug_assertions)]
        {
            let mut seen = self.seen.lock().unwrap();
            assert!(
                seen.insert(node as usize),
                "INVARIANT VIOLATION: node {:#x} deferred twice",
                node as usize
            );
        }

        let pending = Pending {
            ptr: node.cast(),
            dealloc: unsafe {
                std::mem::transmute::<unsafe fn(*mut N), unsafe fn(*mut ())>(dealloc)
            },
        };
        self.pending.lock().unwrap().push(pending);
    }
}

impl Drop for DeferredGuard {
    fn drop(&mut self) {
        for node in self.pending.get_mut().unwrap().drain(..) {
            unsafe { (node.dealloc)(node.ptr) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn dealloc_box<N>(ptr: *mut N) {
        unsafe { drop(Box::from_raw(ptr)) };
    }

    #[test]
    fn frees_deferred_nodes_on_drop() {
        let guard = DeferredGuard::default();
        for i in 0..10i32 {
            let ptr = Box::into_raw(Box::new(i));
            unsafe {
                guard.defer_destroy(ptr, dealloc_box::<i32>);
            }
        }
        // All ten boxes reclaimed when `guard` drops.
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "deferred twice")]
    fn double_defer_panics() {
        let guard = DeferredGuard::default();
        let ptr = Box::into_raw(Box::new(1u8));
        unsafe {
            guard.defer_destroy(ptr, dealloc_box::<u8>);
            guard.defer_destroy(ptr, dealloc_box::<u8>);
        }
    }
}
