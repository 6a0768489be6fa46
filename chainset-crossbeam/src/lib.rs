//! Crossbeam-based reclamation for the chainset family.
//!
//! This crate provides [`EpochGuard`], an implementation of
//! `chainset_core::Guard` on top of crossbeam-epoch, turning the
//! guard-generic sets into production configurations that return memory
//! while running.
//!
//! # Usage
//!
//! ```ignore
//! use chainset_core::{ConcurrentSet, LockFreeSet};
//! use chainset_crossbeam::EpochGuard;
//!
//! let set: LockFreeSet<i64, EpochGuard> = LockFreeSet::new();
//! set.add(42);
//! ```

pub mod epoch_guard;

pub use epoch_guard::EpochGuard;
