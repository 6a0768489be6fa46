//! Whole-structure exclusion: the correctness baseline and scalability
//! floor of the family.

use std::sync::Mutex;

use crate::key::{ChainKey, HashKey, KeyStrategy};
use crate::set::ConcurrentSet;
use crate::sets::node::PlainNode;

/// Ordered set guarded by a single structure-wide lock.
///
/// At most one operation runs at a time system-wide, so the chain is
/// mutated and read under full exclusion and no retry or validation
/// protocol is needed. An unlinked node can have no concurrent holder and
/// is freed immediately.
pub struct CoarseSet<T, K = HashKey> {
    chain: Mutex<Chain<T>>,
    key: K,
}

struct Chain<T> {
    head: *mut PlainNode<T>,
}

// The chain is a set of Box allocations reachable from `head`; the Mutex
// serializes every access to them.
unsafe impl<T: Send> Send for Chain<T> {}

impl<T> Chain<T> {
    fn new() -> Self {
        let tail = PlainNode::alloc(ChainKey::Tail, None, std::ptr::null_mut());
        let head = PlainNode::alloc(ChainKey::Head, None, tail);
        Chain { head }
    }

    /// Walk to the mutation point: returns `(pred, curr)` with
    /// `pred.key < key <= curr.key`. The tail sentinel bounds the walk.
    fn locate(&self, key: ChainKey) -> (*mut PlainNode<T>, *mut PlainNode<T>) {
        unsafe {
            let mut pred = self.head;
            let mut curr = (*pred).next;
            while (*curr).key < key {
                pred = curr;
                curr = (*curr).next;
            }
            (pred, curr)
        }
    }
}

impl<T, K: KeyStrategy<T>> CoarseSet<T, K> {
    pub fn new() -> Self {
        CoarseSet {
            chain: Mutex::new(Chain::new()),
            key: K::default(),
        }
    }

    fn key_of(&self, value: &T) -> ChainKey {
        ChainKey::Value(self.key.key_of(value))
    }
}

impl<T, K: KeyStrategy<T>> Default for CoarseSet<T, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K: KeyStrategy<T>> ConcurrentSet<T> for CoarseSet<T, K> {
    fn add(&self, value: T) -> bool {
        let key = self.key_of(&value);
        let chain = self.chain.lock().unwrap();
        let (pred, curr) = chain.locate(key);
        unsafe {
            if (*curr).key == key {
                return false;
            }
            (*pred).next = PlainNode::alloc(key, Some(value), curr);
        }
        true
    }

    fn remove(&self, value: &T) -> bool {
        let key = self.key_of(value);
        let chain = self.chain.lock().unwrap();
        let (pred, curr) = chain.locate(key);
        unsafe {
            if (*curr).key != key {
                return false;
            }
            (*pred).next = (*curr).next;
            // Exclusive access: nobody else can reference the unlinked node.
            PlainNode::dealloc(curr);
        }
        true
    }

    fn contains(&self, value: &T) -> bool {
        let key = self.key_of(value);
        let chain = self.chain.lock().unwrap();
        let (_, curr) = chain.locate(key);
        unsafe { (*curr).key == key }
    }

    fn len(&self) -> usize {
        let chain = self.chain.lock().unwrap();
        let mut count = 0;
        unsafe {
            let mut curr = (*chain.head).next;
            while (*curr).key != ChainKey::Tail {
                count += 1;
                curr = (*curr).next;
            }
        }
        count
    }

    fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let chain = self.chain.lock().unwrap();
        let mut values = Vec::new();
        unsafe {
            let mut curr = (*chain.head).next;
            while (*curr).key != ChainKey::Tail {
                if let Some(data) = &(*curr).data {
                    values.push(data.clone());
                }
                curr = (*curr).next;
            }
        }
        values
    }
}

impl<T, K> Drop for CoarseSet<T, K> {
    fn drop(&mut self) {
        let chain = self.chain.get_mut().unwrap();
        let mut curr = chain.head;
        while !curr.is_null() {
            unsafe {
                let next = (*curr).next;
                PlainNode::dealloc(curr);
                curr = next;
            }
        }
    }
}
