//! Fine-grained lock coupling.
//!
//! Every traversal in this module is hand-over-hand: the lock on a node's
//! successor is acquired before the node's own lock is released, so the
//! two-node frontier under inspection is never unprotected. Locks are
//! always taken in chain order, which rules out deadlock.
//!
//! Reclamation note: a thread can only hold a reference to a node while
//! holding that node's lock, or the lock of the unique predecessor it read
//! the reference from. An unlinker holds both, so after the unlink no other
//! thread references the node and it is freed immediately — no guard is
//! needed here.

use crate::exclusion::{RawExclusion, SpinExclusion};
use crate::key::{ChainKey, HashKey, KeyStrategy};
use crate::set::ConcurrentSet;
use crate::sets::node::LockedNode;

/// Ordered set with one lock per node and hand-over-hand traversal.
pub struct FineSet<T, K = HashKey, L = SpinExclusion> {
    head: *mut LockedNode<T, L>,
    key: K,
}

unsafe impl<T: Send, K: Send, L: Send> Send for FineSet<T, K, L> {}
unsafe impl<T: Send, K: Sync, L: Send + Sync> Sync for FineSet<T, K, L> {}

impl<T, K, L> FineSet<T, K, L>
where
    K: KeyStrategy<T>,
    L: RawExclusion,
{
    pub fn new() -> Self {
        let tail = LockedNode::alloc(ChainKey::Tail, None, std::ptr::null_mut());
        let head = LockedNode::alloc(ChainKey::Head, None, tail);
        FineSet {
            head,
            key: K::default(),
        }
    }

    fn key_of(&self, value: &T) -> ChainKey {
        ChainKey::Value(self.key.key_of(value))
    }

    /// Hand-over-hand walk to the mutation point. Returns `(pred, curr)`
    /// with `pred.key < key <= curr.key` and **both locks held**; the
    /// caller releases them on every exit path.
    fn locate(&self, key: ChainKey) -> (*mut LockedNode<T, L>, *mut LockedNode<T, L>) {
        unsafe {
            let mut pred = self.head;
            (*pred).lock.acquire();
            let mut curr = (*pred).next_ptr();
            (*curr).lock.acquire();
            while (*curr).key < key {
                (*pred).lock.release();
                pred = curr;
                curr = (*curr).next_ptr();
                (*curr).lock.acquire();
            }
            (pred, curr)
        }
    }
}

impl<T, K, L> Default for FineSet<T, K, L>
where
    K: KeyStrategy<T>,
    L: RawExclusion,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K, L> ConcurrentSet<T> for FineSet<T, K, L>
where
    T: Send,
    K: KeyStrategy<T>,
    L: RawExclusion,
{
    fn add(&self, value: T) -> bool {
        let key = self.key_of(&value);
        let (pred, curr) = self.locate(key);
        unsafe {
            let added = if (*curr).key == key {
                false
            } else {
                // Both neighbors of the splice point are locked.
                let node = LockedNode::alloc(key, Some(value), curr);
                (*pred).set_next(node);
                true
            };
            (*curr).lock.release();
            (*pred).lock.release();
            added
        }
    }

    fn remove(&self, value: &T) -> bool {
        let key = self.key_of(value);
        let (pred, curr) = self.locate(key);
        unsafe {
            if (*curr).key != key {
                (*curr).lock.release();
                (*pred).lock.release();
                return false;
            }
            (*pred).set_next((*curr).next_ptr());
            (*pred).lock.release();
            (*curr).lock.release();
            // Lock coupling proves no other thread references `curr` once
            // the unlink is published (see module doc).
            LockedNode::dealloc(curr);
            true
        }
    }

    fn contains(&self, value: &T) -> bool {
        let key = self.key_of(value);
        let (pred, curr) = self.locate(key);
        unsafe {
            let present = (*curr).key == key;
            (*curr).lock.release();
            (*pred).lock.release();
            present
        }
    }

    fn len(&self) -> usize {
        // Immediate frees mean even read-only walks must lock-couple.
        let mut count = 0;
        unsafe {
            let mut pred = self.head;
            (*pred).lock.acquire();
            let mut curr = (*pred).next_ptr();
            (*curr).lock.acquire();
            while (*curr).key != ChainKey::Tail {
                count += 1;
                (*pred).lock.release();
                pred = curr;
                curr = (*curr).next_ptr();
                (*curr).lock.acquire();
            }
            (*curr).lock.release();
            (*pred).lock.release();
        }
        count
    }

    fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut values = Vec::new();
        unsafe {
            let mut pred = self.head;
            (*pred).lock.acquire();
            let mut curr = (*pred).next_ptr();
            (*curr).lock.acquire();
            while (*curr).key != ChainKey::Tail {
                if let Some(data) = &(*curr).data {
                    values.push(data.clone());
                }
                (*pred).lock.release();
                pred = curr;
                curr = (*curr).next_ptr();
                (*curr).lock.acquire();
            }
            (*curr).lock.release();
            (*pred).lock.release();
        }
        values
    }
}

impl<T, K, L> Drop for FineSet<T, K, L> {
    fn drop(&mut self) {
        // Exclusive access: free the whole chain without locking.
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
