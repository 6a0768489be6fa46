//! Optimistic validation.
//!
//! Traversal takes no locks at all. Once a candidate `(pred, curr)` pair is
//! found, both node locks are acquired and the pair is validated: `pred`
//! must still be reachable from the head and must still point at `curr`.
//! A failed validation releases both locks and restarts the whole search —
//! cheap traversals traded against occasional full re-scans.
//!
//! Because traversals run unlocked, a thread may still be standing on a
//! node after it was unlinked (or may even be blocked on its lock), so
//! removal defers destruction through the set's guard instead of freeing.

use crate::exclusion::{RawExclusion, SpinExclusion};
use crate::guard::Guard;
use crate::key::{ChainKey, HashKey, KeyStrategy};
use crate::set::ConcurrentSet;
use crate::sets::node::LockedNode;

/// Ordered set with unlocked traversal and lock-then-revalidate mutation.
pub struct OptimisticSet<T, G, K = HashKey, L = SpinExclusion> {
    head: *mut LockedNode<T, L>,
    key: K,
    guard: G,
}

unsafe impl<T: Send, G: Send, K: Send, L: Send> Send for OptimisticSet<T, G, K, L> {}
unsafe impl<T: Send, G: Sync, K: Sync, L: Send + Sync> Sync for OptimisticSet<T, G, K, L> {}

impl<T, G, K, L> OptimisticSet<T, G, K, L>
where
    G: Guard,
    K: KeyStrategy<T>,
    L: RawExclusion,
{
    pub fn new() -> Self {
        let tail = LockedNode::alloc(ChainKey::Tail, None, std::ptr::null_mut());
        let head = LockedNode::alloc(ChainKey::Head, None, tail);
        OptimisticSet {
            head,
            key: K::default(),
            guard: G::default(),
        }
    }

    fn key_of(&self, value: &T) -> ChainKey {
        ChainKey::Value(self.key.key_of(value))
    }

    /// Unlocked walk to the candidate pair `pred.key < key <= curr.key`.
    /// The result is a guess until [`Self::validate`] confirms it.
    fn search(&self, key: ChainKey) -> (*mut LockedNode<T, L>, *mut LockedNode<T, L>) {
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

    /// Re-scan from the head while holding both locks: `pred` must still be
    /// in the chain and must still point at `curr`.
    fn validate(&self, pred: *mut LockedNode<T, L>, curr: *mut LockedNode<T, L>) -> bool {
        unsafe {
            let mut node = self.head;
            while (*node).key <= (*pred).key {
                if node == pred {
                    return (*pred).next_ptr() == curr;
                }
                node = (*node).next_ptr();
            }
            false
        }
    }
}

impl<T, G, K, L> Default for OptimisticSet<T, G, K, L>
where
    G: Guard,
    K: KeyStrategy<T>,
    L: RawExclusion,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, G, K, L> ConcurrentSet<T> for OptimisticSet<T, G, K, L>
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
                        let node = LockedNode::alloc(key, value.take(), curr);
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
                        (*pred).set_next((*curr).next_ptr());
                        true
                    } else {
                        false
                    };
                    (*curr).lock.release();
                    (*pred).lock.release();
                    if removed {
                        // A traversal that started before the unlink may
                        // still reach `curr`; destruction waits for the
                        // guard.
                        self.guard.defer_destroy(curr, LockedNode::dealloc);
                    }
                    return removed;
                }
                (*curr).lock.release();
                (*pred).lock.release();
            }
        }
    }

    fn contains(&self, value: &T) -> bool {
        let key = self.key_of(value);
        let _read = G::pin();
        loop {
            let (pred, curr) = self.search(key);
            unsafe {
                (*pred).lock.acquire();
                (*curr).lock.acquire();
                if self.validate(pred, curr) {
                    let present = (*curr).key == key;
                    (*curr).lock.release();
                    (*pred).lock.release();
                    return present;
                }
                (*curr).lock.release();
                (*pred).lock.release();
            }
        }
    }

    fn len(&self) -> usize {
        let _read = G::pin();
        let mut count = 0;
        unsafe {
            let mut curr = (*self.head).next_ptr();
            while (*curr).key != ChainKey::Tail {
                count += 1;
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
                if let Some(data) = &(*curr).data {
                    values.push(data.clone());
                }
                curr = (*curr).next_ptr();
            }
        }
        values
    }
}

impl<T, G, K, L> Drop for OptimisticSet<T, G, K, L> {
    fn drop(&mut self) {
        // Free the reachable chain; unlinked nodes belong to the guard,
        // which is dropped right after and must not see them twice.
        let mut curr = self.head;
        while !curr.is_null() {
            unsafe {
                let next = (*curr).next_ptr();
                LockedNode::dealloc(curr);
                curr = next;
            }
        }
    }
}
