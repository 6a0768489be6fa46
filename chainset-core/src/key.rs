//! Key derivation for chain ordering.
//!
//! Every set variant positions a value in its chain by a `u64` key derived
//! through a [`KeyStrategy`]. The chain itself is bounded by two permanent
//! sentinel nodes, so the internal [`ChainKey`] adds artificial extremes
//! below and above every derivable key. This avoids reserving `0` and
//! `u64::MAX` for the sentinels and the hash-collision bug that comes with
//! that reservation.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Internal total-order key: `Head < Value(k) < Tail` for every `k`.
///
/// Sentinels carry `Head`/`Tail` and no data. Data nodes always carry
/// `Value(k)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum ChainKey {
    Head,
    Value(u64),
    Tail,
}

/// Derives a deterministic total-order key from a stored value.
///
/// Two values with equal keys are treated as the same set element. A
/// non-injective strategy therefore aliases values; that is a documented
/// limitation of the strategy, not of the sets.
pub trait KeyStrategy<T>: Default + Send + Sync {
    fn key_of(&self, value: &T) -> u64;
}

/// Default strategy: hash the value with the standard library's
/// `DefaultHasher` (deterministic, fixed-key SipHash).
#[derive(Debug, Default, Clone, Copy)]
pub struct HashKey;

impl<T: Hash> KeyStrategy<T> for HashKey {
    fn key_of(&self, value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }
}

/// Injective, order-preserving strategy for integer values.
///
/// Useful in tests: with `CastKey` the chain order is the numeric order of
/// the stored values, so snapshots can be checked for sortedness directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct CastKey;

const SIGN_FLIP: u64 = 1 << 63;

impl KeyStrategy<u64> for CastKey {
    fn key_of(&self, value: &u64) -> u64 {
        *value
    }
}

impl KeyStrategy<u32> for CastKey {
    fn key_of(&self, value: &u32) -> u64 {
        u64::from(*value)
    }
}

impl KeyStrategy<usize> for CastKey {
    fn key_of(&self, value: &usize) -> u64 {
        *value as u64
    }
}

impl KeyStrategy<i64> for CastKey {
    fn key_of(&self, value: &i64) -> u64 {
        (*value as u64) ^ SIGN_FLIP
    }
}

impl KeyStrategy<i32> for CastKey {
    fn key_of(&self, value: &i32) -> u64 {
        (i64::from(*value) as u64) ^ SIGN_FLIP
    }
}
