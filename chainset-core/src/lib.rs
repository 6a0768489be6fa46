//! A family of concurrent ordered sets over one singly linked chain
//! layout, differing only in how they synchronize: a structure-wide lock
//! ([`CoarseSet`]), hand-over-hand lock coupling ([`FineSet`]), optimistic
//! lock-and-validate ([`OptimisticSet`]), lazy logical deletion
//! ([`LazySet`]), and CAS-only lock freedom ([`LockFreeSet`]).
//!
//! All five share the [`ConcurrentSet`] trait, sentinel-bounded chains,
//! and a pluggable [`KeyStrategy`]. The variants that let readers stand on
//! unlinked nodes are generic over a [`Guard`] that decides when detached
//! memory is reclaimed.

pub mod common_tests;
pub mod exclusion;
pub mod guard;
pub mod key;
pub mod marked;
pub mod set;
pub mod sets;

pub use exclusion::{RawExclusion, SpinExclusion};
pub use guard::{DeferredGuard, Guard};
pub use key::{CastKey, HashKey, KeyStrategy};
pub use marked::AtomicMarkableReference;
pub use set::ConcurrentSet;
pub use sets::{CoarseSet, FineSet, LazySet, LockFreeSet, OptimisticSet};
