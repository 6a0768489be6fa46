//! The contract shared by all five set variants.

/// A concurrent ordered set over a singly linked chain.
///
/// All five implementations expose the same three operations and are
/// linearizable: every `add`/`remove`/`contains` call appears to take
/// effect atomically at a single instant between its invocation and its
/// return. Duplicate adds and absent removes are ordinary `false` results,
/// not errors.
///
/// `len` and `to_vec` are advisory under concurrent mutation: they walk the
/// chain without freezing it and reflect some mid-flight interleaving.
pub trait ConcurrentSet<T> {
    /// Insert `value`. Returns `true` iff it was not already present.
    fn add(&self, value: T) -> bool;

    /// Remove `value`. Returns `true` iff it was present.
    fn remove(&self, value: &T) -> bool;

    /// Current membership of `value`.
    fn contains(&self, value: &T) -> bool;

    /// Advisory number of logically present elements.
    fn len(&self) -> usize;

    /// Advisory emptiness check.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Advisory snapshot of the logically present elements in key order.
    fn to_vec(&self) -> Vec<T>
    where
        T: Clone;
}
