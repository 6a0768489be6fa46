//! Chain node definitions shared by the set variants.
//!
//! All nodes are `Box`-allocated and handled through raw pointers; the
//! variant algorithms decide when a node may be freed (immediately under
//! proven exclusion, or deferred through a [`Guard`](crate::Guard)).
//! Sentinels carry `ChainKey::Head`/`ChainKey::Tail` and `data: None`; data
//! nodes always carry `Some`.

use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use crate::key::ChainKey;
use crate::marked::AtomicMarkableReference;

/// Plain chain element for [`CoarseSet`](crate::CoarseSet): every access is
/// serialized by the structure-wide lock, so the successor link needs no
/// atomicity of its own.
pub(crate) struct PlainNode<T> {
    pub(crate) key: ChainKey,
    pub(crate) data: Option<T>,
    pub(crate) next: *mut PlainNode<T>,
}

impl<T> PlainNode<T> {
    pub(crate) fn alloc(key: ChainKey, data: Option<T>, next: *mut Self) -> *mut Self {
        Box::into_raw(Box::new(PlainNode { key, data, next }))
    }

    /// # Safety
    /// `ptr` must come from [`PlainNode::alloc`] and not be freed twice.
    pub(crate) unsafe fn dealloc(ptr: *mut Self) {
        unsafe { drop(Box::from_raw(ptr)) };
    }
}

/// Chain element with a per-node lock, for [`FineSet`](crate::FineSet) and
/// [`OptimisticSet`](crate::OptimisticSet).
///
/// The successor is atomic because the optimistic variant traverses without
/// holding any lock; writers publish with `Release`, traversals read with
/// `Acquire`.
pub(crate) struct LockedNode<T, L> {
    pub(crate) key: ChainKey,
    pub(crate) data: Option<T>,
    pub(crate) lock: L,
    next: AtomicPtr<LockedNode<T, L>>,
}

impl<T, L> LockedNode<T, L> {
    pub(crate) fn alloc(key: ChainKey, data: Option<T>, next: *mut Self) -> *mut Self
    where
        L: Default,
    {
        Box::into_raw(Box::new(LockedNode {
            key,
            data,
            lock: L::default(),
            next: AtomicPtr::new(next),
        }))
    }

    #[inline]
    pub(crate) fn next_ptr(&self) -> *mut Self {
        self.next.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn set_next(&self, ptr: *mut Self) {
        self.next.store(ptr, Ordering::Release);
    }

    /// # Safety
    /// `ptr` must come from [`LockedNode::alloc`] and not be freed twice.
    pub(crate) unsafe fn dealloc(ptr: *mut Self) {
        unsafe { drop(Box::from_raw(ptr)) };
    }
}

/// [`LockedNode`] plus a logical-deletion flag, for
/// [`LazySet`](crate::LazySet).
///
/// The flag is monotonic: once set it is never cleared, and physical
/// unlinking only happens with the flag already set.
pub(crate) struct FlaggedNode<T, L> {
    pub(crate) key: ChainKey,
    pub(crate) data: Option<T>,
    pub(crate) lock: L,
    removed: AtomicBool,
    next: AtomicPtr<FlaggedNode<T, L>>,
}

impl<T, L> FlaggedNode<T, L> {
    pub(crate) fn alloc(key: ChainKey, data: Option<T>, next: *mut Self) -> *mut Self
    where
        L: Default,
    {
        Box::into_raw(Box::new(FlaggedNode {
            key,
            data,
            lock: L::default(),
            removed: AtomicBool::new(false),
            next: AtomicPtr::new(next),
        }))
    }

    #[inline]
    pub(crate) fn next_ptr(&self) -> *mut Self {
        self.next.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn set_next(&self, ptr: *mut Self) {
        self.next.store(ptr, Ordering::Release);
    }

    #[inline]
    pub(crate) fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn set_removed(&self) {
        self.removed.store(true, Ordering::Release);
    }

    /// # Safety
    /// `ptr` must come from [`FlaggedNode::alloc`] and not be freed twice.
    pub(crate) unsafe fn dealloc(ptr: *mut Self) {
        unsafe { drop(Box::from_raw(ptr)) };
    }
}

/// Chain element for [`LockFreeSet`](crate::LockFreeSet): the deletion mark
/// lives in the node's own successor link and changes with it in one CAS.
pub(crate) struct MarkableNode<T> {
    pub(crate) key: ChainKey,
    pub(crate) data: Option<T>,
    pub(crate) next: AtomicMarkableReference<MarkableNode<T>>,
}

impl<T> MarkableNode<T> {
    pub(crate) fn new(key: ChainKey, data: Option<T>) -> Self {
        MarkableNode {
            key,
            data,
            next: AtomicMarkableReference::new(ptr::null_mut(), false),
        }
    }

    pub(crate) fn alloc(key: ChainKey, data: Option<T>, next: *mut Self) -> *mut Self {
        Box::into_raw(Box::new(MarkableNode {
            key,
            data,
            next: AtomicMarkableReference::new(next, false),
        }))
    }

    /// # Safety
    /// `ptr` must come from a `Box` allocation of `Self` and not be freed
    /// twice.
    pub(crate) unsafe fn dealloc(ptr: *mut Self) {
        unsafe { drop(Box::from_raw(ptr)) };
    }
}
