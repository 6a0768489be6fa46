//! The five set implementations, ordered by how much concurrency they
//! admit: one structure-wide lock, lock coupling, optimistic validation,
//! lazy logical deletion, and CAS-only lock freedom.

mod coarse;
mod fine;
mod lazy;
mod lock_free;
mod node;
mod optimistic;

pub use coarse::CoarseSet;
pub use fine::FineSet;
pub use lazy::LazySet;
pub use lock_free::LockFreeSet;
pub use optimistic::OptimisticSet;
