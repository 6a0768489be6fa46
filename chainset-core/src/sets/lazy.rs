//! Lazy logical deletion.
//!
//! Like the optimistic set, but every node carries a monotonic `removed`
//! flag. Two consequences:
//!
//! - `contains` becomes wait-free: a plain pointer chase, with presence
//!   read off the flag at the moment of inspection.
//! - validation becomes O(1): `!pred.removed && !curr.removed &&
//!   pred.next == curr` replaces the full re-scan, because a set flag never
//!   clears and unlinking never precedes the flag.
//!
//! `remove` sets the flag **before** unlinking; that store is the
//! operation's linearization point.

use crate::exclusion::{RawExclusion, SpinExclusion};
use crate::guard::Guard;
use crate::key::{ChainKey, HashKey, KeyStrategy};
use crate::set::ConcurrentSet;
use crate::sets::node::FlaggedNode;

/// Ordered set with lazy logical deletion and wait-free membership.
pub struct LazySet<T, G, K = HashKey, L = SpinExclusion> {
    head: *mut FlaggedNode<T, L>,
    key: K,
    guard: G,
}

unsafe impl<T: Send, G: Send, K: Send, L: Send> Send for LazySet<T, G, K, L> {}
unsafe impl<T: Send, G: Sync, K: Sync, L: Send + Sync> Sync for LazySet<T, G, K, L> {}

impl<T, G, K, L> LazySet<T, G, K, L>
where
    G: Guard,
    K: KeyStrategy<T>,
    L: RawExclusion,
{
    pub fn new() -> Self {
        let tail = FlaggedNode::alloc(ChainKey::Tail, None, std::ptr::null_mut());
        let head = FlaggedNode::alloc(ChainKey::Head, None, tail);
        LazySet {
            head,
            key: K::default(),
            guard: G::default(),
        }
    }

    fn key_of(&self, value: &T) -> ChainKey {
        ChainKey::Value(self.key.key_of(value))
    }

    /// Unlocked walk to the candidate pair `pred.key < key <= curr.key`.
    fn search(&self, key: ChainKey) -> (*mut FlaggedNode<T, L>, *mut FlaggedNode<T, L>) {
        unsafe {
            let mut pred = self.head;
            let mut curr = (*pred).next_ptr();
            while (*curr).key < key {
                pred = curr;
                curr = (*curr).next_ptr();
            }
            (pred, curr)
        }
    }

    /// O(1) validation: both nodes still logically present and adjacent.
    fn validate(&self, pred: *mut FlaggedNode<T, L>, curr: *mut FlaggedNode<T, L>) -> bool {
        unsafe { !(*pred).is_removed() && !(*curr).is_removed() && (*pred).next_ptr() == curr }
    }
}

impl<T, G, K, L> Default for LazySet<T, G, K, L>
where
    G: Guard,
    K: KeyStrategy<T>,
    L: RawExclusion,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, G, K, L> ConcurrentSet<T> for LazySet<T, G, K, L>
where
    T: Send,
    G: Guard,
    K: KeyStrategy<T>,
    L: RawExclusion,
{
    fn add(&self, value: T) -> bool {
        let key = self.key_of(&value);
        let _read = G::pin();
        let mut value = Some(value);
        loop {
            let (pred, curr) = self.search(key);
            unsafe {
                (*pred).lock.acquire();
                (*curr).lock.acquire();
                if self.validate(pred, curr) {
                    let added = if (*curr).key == key {
                        false
                    } else {
                        let node = FlaggedNode::alloc(key, value.take(), curr);
                        (*pred).set_next(node);
                        true
                    };
                    (*curr).lock.release();
                    (*pred).lock.release();
                    return added;
                }
                (*curr).lock.release();
                (*pred).lock.release();
            }
        }
    }

    fn remove(&self, value: &T) -> bool {
        let key = self.key_of(value);
        let _read = G::pin();
        loop {
            let (pred, curr) = self.search(key);
            unsafe {
                (*pred).lock.acquire();
                (*curr).lock.acquire();
                if self.validate(pred, curr) {
                    let removed = if (*curr).key == key {
                        // Linearization point: the flag flips before the
                        // physical unlink, so a wait-free `contains` that
                        // sees the flag already reports absence.
                        (*curr).set_removed();
                        (*pred).set_next((*curr).next_ptr());
                        true
                    } else {
                        false
                    };
                    (*curr).lock.release();
                    (*pred).lock.release();
                    if removed {
                        self.guard.defer_destroy(curr, FlaggedNode::dealloc);
                    }
                    return removed;
                }
                (*curr).lock.release();
                (*pred).lock.release();
            }
        }
    }

    /// Wait-free: no locks, no retries, bounded by the chain length.
    fn contains(&self, value: &T) -> bool {
        let key = self.key_of(value);
        let _read = G::pin();
        unsafe {
            let mut curr = (*self.head).next_ptr();
            while (*curr).key < key {
                curr = (*curr).next_ptr();
            }
            (*curr).key == key && !(*curr).is_removed()
        }
    }

    fn len(&self) -> usize {
        let _read = G::pin();
        let mut count = 0;
        unsafe {
            let mut curr = (*self.head).next_ptr();
            while (*curr).key != ChainKey::Tail {
                if !(*curr).is_removed() {
                    count += 1;
                }
                curr = (*curr).next_ptr();
            }
        }
        count
    }

    fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let _read = G::pin();
        let mut values = Vec::new();
        unsafe {
            let mut curr = (*self.head).next_ptr();
            while (*curr).key != ChainKey::Tail {
                if !(*curr).is_removed() {
                    if let Some(data) = &(*curr).data {
                        values.push(data.clone());
                    }
                }
                curr = (*curr).next_ptr();
            }
        }
        values
    }
}

impl<T, G, K, L> Drop for LazySet<T, G, K, L> {
    fn drop(&mut self) {
        let mut curr = self.head;
        while !curr.is_null() {
            unsafe {
                let next = (*curr).next_ptr();
                FlaggedNode::dealloc(curr);
                curr = next;
            }
        }
    }
}
