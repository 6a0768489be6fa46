//! Memory reclamation for detached chain nodes.
//!
//! A node that has been physically unlinked may still be referenced by a
//! traversal that started before the unlink: the optimistic, lazy and
//! lock-free sets all walk the chain without locks. Detached nodes are
//! therefore never freed eagerly; their destruction is handed to a guard
//! and happens once no thread can still hold a reference.
//!
//! Sets are generic over the guard type:
//!
//! ```text
//! LockFreeSet<T, DeferredGuard>   - testing: freed when the set drops
//! LockFreeSet<T, EpochGuard>      - production: crossbeam-epoch (chainset-crossbeam)
//! ```

mod deferred_guard;

pub use deferred_guard::DeferredGuard;

/// A memory reclamation strategy for unlinked nodes.
///
/// # Safety contract
///
/// Implementations must not run a deferred `dealloc` while any thread that
/// pinned a [`Guard::pin`] read guard before the `defer_destroy` call still
/// holds it.
pub trait Guard: Default + Send + Sync {
    /// An active guard protecting all node reads for its lifetime.
    type ReadGuard;

    /// Pin the current thread for a read section.
    ///
    /// Every set operation pins before touching the chain and unpins when
    /// it returns.
    fn pin() -> Self::ReadGuard;

    /// Schedule an unlinked node for destruction.
    ///
    /// # Safety
    ///
    /// - `node` must no longer be reachable from the chain head.
    /// - `node` must not be deferred twice.
    /// - `dealloc` must be the deallocation function matching the node's
    ///   allocation.
    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N));
}
