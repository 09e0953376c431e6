//! The shared contract implemented by all three mining engines.

use crate::error::Result;
use crate::{Itemset, ItemType};

/// Uniform interface over a sliding-window closed-itemset miner.
///
/// `add` and `delete` are not idempotent in the semantic sense: adding the
/// same itemset twice records two occurrences, and a matching number of
/// `delete` calls is required to remove them. `add`/`delete` precondition and
/// invariant violations are reported through [`crate::error::MiningError`];
/// an empty query (e.g. `closed_frequent` with `t` above the largest support
/// in an empty window) simply returns an empty collection, never an error.
///
/// Implementors must be object-safe so that a driver can select an engine at
/// runtime via `Box<dyn SlidingWindowAlgorithm<T>>` (spec's "dynamic
/// dispatch" design note).
pub trait SlidingWindowAlgorithm<T: ItemType> {
    /// Record one more occurrence of transaction `x` in the window.
    fn add(&mut self, x: Itemset<T>) -> Result<()>;

    /// Remove one occurrence of transaction `x` from the window. `x` must
    /// have been previously added and not yet deleted a matching number of
    /// times.
    fn delete(&mut self, x: &Itemset<T>) -> Result<()>;

    /// Number of window transactions containing `x` as a subset. 0 if `x`
    /// never occurred.
    fn support(&self, x: &Itemset<T>) -> usize;

    /// All closed itemsets currently represented.
    fn closed_itemsets(&self) -> Vec<Itemset<T>>;

    /// Closed itemsets with support at least `t`.
    fn closed_frequent(&self, t: usize) -> Vec<Itemset<T>>;
}
