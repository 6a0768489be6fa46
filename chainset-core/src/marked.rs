//! An atomically updatable (pointer, mark) pair.
//!
//! The lock-free set stores each node's deletion mark in the low bit of
//! that node's successor pointer, so the pointer and the mark always change
//! together in a single CAS. Two independently-atomic fields would not do:
//! a reader could then observe a fresh pointer with a stale mark (or the
//! reverse), which is exactly the ABA-style torn update this encoding
//! exists to rule out.
//!
//! The packing relies on node allocations being at least 2-byte aligned,
//! which `Box`-allocated structs always are.

use std::sync::atomic::{AtomicPtr, Ordering};

const MARK_BIT: usize = 0b1;

#[inline]
fn pack<N>(ptr: *mut N, mark: bool) -> *mut N {
    debug_assert_eq!(
        ptr as usize & MARK_BIT,
        0,
        "node pointer must be at least 2-byte aligned"
    );
    (ptr as usize | usize::from(mark)) as *mut N
}

#[inline]
fn raw_ptr<N>(raw: *mut N) -> *mut N {
    (raw as usize & !MARK_BIT) as *mut N
}

#[inline]
fn raw_mark<N>(raw: *mut N) -> bool {
    (raw as usize & MARK_BIT) != 0
}

/// A (reference, bool) pair whose two halves update in one CAS.
pub struct AtomicMarkableReference<N> {
    inner: AtomicPtr<N>,
}

impl<N> AtomicMarkableReference<N> {
    pub fn new(ptr: *mut N, mark: bool) -> Self {
        AtomicMarkableReference {
            inner: AtomicPtr::new(pack(ptr, mark)),
        }
    }

    /// Load both halves of the pair.
    #[inline]
    pub fn load(&self) -> (*mut N, bool) {
        let raw = self.inner.load(Ordering::Acquire);
        (raw_ptr(raw), raw_mark(raw))
    }

    /// Load only the reference, ignoring the mark.
    #[inline]
    pub fn reference(&self) -> *mut N {
        raw_ptr(self.inner.load(Ordering::Acquire))
    }

    /// Load only the mark.
    #[inline]
    pub fn is_marked(&self) -> bool {
        raw_mark(self.inner.load(Ordering::Acquire))
    }

    /// Unconditionally set both halves.
    #[inline]
    pub fn store(&self, ptr: *mut N, mark: bool) {
        self.inner.store(pack(ptr, mark), Ordering::Release);
    }

    /// CAS the pair from `(expected, expected_mark)` to `(new, new_mark)`.
    ///
    /// Returns `true` iff the pair matched and was replaced.
    #[inline]
    pub fn compare_and_set(
        &self,
        expected: *mut N,
        new: *mut N,
        expected_mark: bool,
        new_mark: bool,
    ) -> bool {
        self.inner
            .compare_exchange(
                pack(expected, expected_mark),
                pack(new, new_mark),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Try to set the mark while the reference equals `expected`, keeping
    /// the reference unchanged. May fail spuriously under contention.
    #[inline]
    pub fn attempt_mark(&self, expected: *mut N, mark: bool) -> bool {
        let raw = self.inner.load(Ordering::Acquire);
        if raw_ptr(raw) != expected {
            return false;
        }
        self.inner
            .compare_exchange(raw, pack(expected, mark), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
