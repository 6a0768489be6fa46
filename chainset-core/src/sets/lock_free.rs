//! Lock-free CAS-driven mutation.
//!
//! No operation ever blocks. Each node's deletion mark is packed into that
//! node's successor link ([`AtomicMarkableReference`](crate::AtomicMarkableReference)),
//! so marking and
//! re-pointing are a single CAS and no observer can see a fresh pointer
//! with a stale mark.
//!
//! Removal is two-phase:
//!
//! 1. **Logical**: CAS the victim's own link from `(succ, false)` to
//!    `(succ, true)`. Success is the linearization point.
//! 2. **Physical**: CAS the predecessor's link from `(victim, false)` to
//!    `(succ, false)`. The remover tries this once; if it loses, the
//!    victim stays reachable until a later [`LockFreeSet::find`] pass
//!    splices it out. Every traversal through `find` snips the marked
//!    nodes it meets, so a marked node survives only while no `add` or
//!    `remove` passes its position.
//!
//! `add`/`remove` are lock-free (retries are possible, system-wide progress
//! is not blocked); `contains` is wait-free.

use crossbeam_utils::Backoff;

use crate::guard::Guard;
use crate::key::{ChainKey, HashKey, KeyStrategy};
use crate::set::ConcurrentSet;
use crate::sets::node::MarkableNode;

/// Ordered set mutated exclusively through (pointer, mark) CAS.
pub struct LockFreeSet<T, G, K = HashKey> {
    head: *mut MarkableNode<T>,
    key: K,
    guard: G,
}

unsafe impl<T: Send, G: Send, K: Send> Send for LockFreeSet<T, G, K> {}
unsafe impl<T: Send, G: Sync, K: Sync> Sync for LockFreeSet<T, G, K> {}

impl<T, G, K> LockFreeSet<T, G, K>
where
    G: Guard,
    K: KeyStrategy<T>,
{
    pub fn new() -> Self {
        let tail = MarkableNode::alloc(ChainKey::Tail, None, std::ptr::null_mut());
        let head = MarkableNode::alloc(ChainKey::Head, None, tail);
        LockFreeSet {
            head,
            key: K::default(),
            guard: G::default(),
        }
    }

    fn key_of(&self, value: &T) -> ChainKey {
        ChainKey::Value(self.key.key_of(value))
    }

    /// Traverse to `(pred, curr)` with `pred.key < key <= curr.key`,
    /// `pred` unmarked and `pred.next == (curr, false)` at the moment of
    /// the last load.
    ///
    /// Marked nodes met along the way are spliced out; a failed splice
    /// means the predecessor's link changed under us, and the whole search
    /// restarts from the head. The winner of a splice CAS is the unique
    /// thread that defers the node's destruction: any stale link to the
    /// node sits in a node that is itself marked, so its `(curr, false)`
    /// expectation can never match.
    fn find(&self, key: ChainKey) -> (*mut MarkableNode<T>, *mut MarkableNode<T>) {
        'retry: loop {
            unsafe {
                let mut pred = self.head;
                let mut curr = (*pred).next.reference();
                loop {
                    let (mut succ, mut marked) = (*curr).next.load();
                    while marked {
                        if !(*pred).next.compare_and_set(curr, succ, false, false) {
                            continue 'retry;
                        }
                        self.guard.defer_destroy(curr, MarkableNode::dealloc);
                        curr = succ;
                        let (next_succ, next_marked) = (*curr).next.load();
                        succ = next_succ;
                        marked = next_marked;
                    }
                    if (*curr).key >= key {
                        return (pred, curr);
                    }
                    pred = curr;
                    curr = succ;
                }
            }
        }
    }
}

impl<T, G, K> Default for LockFreeSet<T, G, K>
where
    G: Guard,
    K: KeyStrategy<T>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, G, K> ConcurrentSet<T> for LockFreeSet<T, G, K>
where
    T: Send,
    G: Guard,
    K: KeyStrategy<T>,
{
    fn add(&self, value: T) -> bool {
        let key = self.key_of(&value);
        let _read = G::pin();
        let backoff = Backoff::new();
        // One allocation, reused across CAS retries.
        let mut node = Box::new(MarkableNode::new(key, Some(value)));
        loop {
            let (pred, curr) = self.find(key);
            unsafe {
                if (*curr).key == key {
                    return false;
                }
                node.next.store(curr, false);
                let raw = Box::into_raw(node);
                if (*pred).next.compare_and_set(curr, raw, false, false) {
                    // Linearization point: the link CAS published the node.
                    return true;
                }
                // Lost the race for pred's link: take the allocation back
                // and search again.
                node = Box::from_raw(raw);
            }
            backoff.spin();
        }
    }

    fn remove(&self, value: &T) -> bool {
        let key = self.key_of(value);
        let _read = G::pin();
        let backoff = Backoff::new();
        loop {
            let (pred, curr) = self.find(key);
            unsafe {
                if (*curr).key != key {
                    return false;
                }
                let (succ, marked) = (*curr).next.load();
                if marked || !(*curr).next.compare_and_set(succ, succ, false, true) {
                    // Someone else marked or re-pointed curr first.
                    backoff.spin();
                    continue;
                }
                // Linearization point passed: curr is logically gone. Try
                // the physical unlink once; on failure the next find() pass
                // through this position completes it.
                if (*pred).next.compare_and_set(curr, succ, false, false) {
                    self.guard.defer_destroy(curr, MarkableNode::dealloc);
                }
                return true;
            }
        }
    }

    /// Wait-free: a pure pointer chase with no CAS and no retry. It may
    /// walk straight through nodes that are being removed; their memory is
    /// protected by the pinned guard.
    fn contains(&self, value: &T) -> bool {
        let key = self.key_of(value);
        let _read = G::pin();
        unsafe {
            let mut curr = (*self.head).next.reference();
            while (*curr).key < key {
                curr = (*curr).next.reference();
            }
            (*curr).key == key && !(*curr).next.is_marked()
        }
    }

    fn len(&self) -> usize {
        let _read = G::pin();
        let mut count = 0;
        unsafe {
            let mut curr = (*self.head).next.reference();
            while (*curr).key != ChainKey::Tail {
                if !(*curr).next.is_marked() {
                    count += 1;
                }
                curr = (*curr).next.reference();
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
            let mut curr = (*self.head).next.reference();
            while (*curr).key != ChainKey::Tail {
                if !(*curr).next.is_marked() {
                    if let Some(data) = &(*curr).data {
                        values.push(data.clone());
                    }
                }
                curr = (*curr).next.reference();
            }
        }
        values
    }
}

impl<T, G, K> Drop for LockFreeSet<T, G, K> {
    fn drop(&mut self) {
        // Reachable nodes (marked or not) are freed here; spliced-out nodes
        // belong to the guard and are reclaimed by its own drop.
        let mut curr = self.head;
        while !curr.is_null() {
            unsafe {
                let next = (*curr).next.reference();
                MarkableNode::dealloc(curr);
                curr = next;
            }
        }
    }
}
