//! `Itemset<T>` is the set algebra shared by all three mining engines.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::ItemType;

/// A finite set of items of a totally ordered domain, kept in ascending
/// natural order for canonical iteration, equality and hashing.
///
/// Cloning is cheap relative to the itemsets engines actually deal with
/// (single-digit to low-dozens of items), so `Itemset` is passed by value at
/// the API boundary and cloned internally wherever an engine needs to keep a
/// long-lived copy, mirroring the teacher's treatment of `Vec<T>` transactions.
#[derive(Clone, Eq, PartialEq, Hash, Default)]
pub struct Itemset<T: ItemType> {
    items: Vec<T>,
}

impl<T: ItemType> fmt::Debug for Itemset<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.items.iter()).finish()
    }
}

impl<T: ItemType> Itemset<T> {
    /// An empty itemset.
    pub fn new() -> Self {
        Itemset { items: Vec::new() }
    }

    /// Build an itemset from an iterator of items, deduplicating and sorting
    /// into canonical order.
    pub fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut items: Vec<T> = iter.into_iter().collect();
        items.sort();
        items.dedup();
        Itemset { items }
    }

    /// Insert a single item, keeping canonical order. No-op if already present.
    pub fn insert(&mut self, item: T) {
        match self.items.binary_search(&item) {
            Ok(_) => {}
            Err(pos) => self.items.insert(pos, item),
        }
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate items in canonical (natural) order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Whether `item` is a member of this set.
    pub fn contains_item(&self, item: &T) -> bool {
        self.items.binary_search(item).is_ok()
    }

    /// Superset test: whether `self` contains every item of `other`.
    pub fn contains(&self, other: &Itemset<T>) -> bool {
        if other.len() > self.len() {
            return false;
        }
        other.items.iter().all(|i| self.contains_item(i))
    }

    /// Strict superset test (`self` contains `other` and is larger).
    pub fn strictly_contains(&self, other: &Itemset<T>) -> bool {
        self.len() > other.len() && self.contains(other)
    }

    /// In-place union.
    pub fn union_with(&mut self, other: &Itemset<T>) {
        for &item in other.items.iter() {
            self.insert(item);
        }
    }

    /// Functional union; never mutates either input.
    pub fn union(&self, other: &Itemset<T>) -> Itemset<T> {
        let mut result = self.clone();
        result.union_with(other);
        result
    }

    /// In-place intersection (`retainAll` in spec terms): keep only items
    /// also present in `other`.
    pub fn retain_all(&mut self, other: &Itemset<T>) {
        self.items.retain(|i| other.contains_item(i));
    }

    /// Functional intersection; never mutates either input.
    pub fn intersection(&self, other: &Itemset<T>) -> Itemset<T> {
        let items: Vec<T> = self
            .items
            .iter()
            .copied()
            .filter(|i| other.contains_item(i))
            .collect();
        Itemset { items }
    }

    /// All non-empty subsets, in descending length order. Equal-length
    /// subsets may come back in any stable order: this operation is advisory
    /// and not on the hot path of any engine.
    pub fn subsets_in_descending_length(&self) -> Vec<Itemset<T>> {
        let n = self.items.len();
        if n == 0 {
            return Vec::new();
        }
        let mut subsets = Vec::with_capacity((1usize << n) - 1);
        for mask in 1..(1u32 << n) {
            let mut items = Vec::with_capacity(mask.count_ones() as usize);
            for (i, &item) in self.items.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    items.push(item);
                }
            }
            subsets.push(Itemset { items });
        }
        subsets.sort_by(|a, b| b.len().cmp(&a.len()));
        subsets
    }

    /// Lexicographic compare over items in natural `T` order.
    pub fn lex_cmp(&self, other: &Itemset<T>) -> Ordering {
        self.items.cmp(&other.items)
    }

    /// History-order compare: lexicographic compare over items ranked by
    /// `history` (first-appearance position in the stream) rather than by
    /// `T`'s own order. An empty itemset, or a strict rank-prefix of the
    /// other, is smaller. Every item of both sets must already be registered
    /// in `history` — this is guaranteed by the DIU engine, which always
    /// registers an itemset's items before comparing it.
    pub fn history_cmp(&self, other: &Itemset<T>, history: &HashMap<T, u32>) -> Ordering {
        let rank = |t: &T| -> u32 {
            *history
                .get(t)
                .expect("history_cmp called with an item absent from history")
        };
        let mut a: Vec<u32> = self.items.iter().map(rank).collect();
        let mut b: Vec<u32> = other.items.iter().map(rank).collect();
        a.sort_unstable();
        b.sort_unstable();
        a.cmp(&b)
    }
}

impl<T: ItemType> PartialOrd for Itemset<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ItemType> Ord for Itemset<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lex_cmp(other)
    }
}

impl<T: ItemType> FromIterator<T> for Itemset<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Itemset::from_iter(iter)
    }
}

impl<T: ItemType> IntoIterator for Itemset<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_and_equality() {
        let a = Itemset::from_iter(['c', 'a', 'b', 'a']);
        let b = Itemset::from_iter(['a', 'b', 'c']);
        assert_eq!(a, b);
        assert_eq!(a.as_slice(), &['a', 'b', 'c']);
    }

    #[test]
    fn superset_and_intersection() {
        let abc = Itemset::from_iter(['a', 'b', 'c']);
        let ab = Itemset::from_iter(['a', 'b']);
        let bd = Itemset::from_iter(['b', 'd']);
        assert!(abc.contains(&ab));
        assert!(abc.strictly_contains(&ab));
        assert!(!ab.contains(&abc));
        assert_eq!(abc.intersection(&bd), Itemset::from_iter(['b']));
        assert_eq!(ab.union(&bd), Itemset::from_iter(['a', 'b', 'd']));
    }

    #[test]
    fn subsets_descending_length() {
        let ab = Itemset::from_iter(['a', 'b']);
        let subsets = ab.subsets_in_descending_length();
        let lens: Vec<usize> = subsets.iter().map(|s| s.len()).collect();
        assert_eq!(lens, vec![2, 1, 1]);
    }

    #[test]
    fn history_order_prefix_rule() {
        let mut history = HashMap::new();
        history.insert('a', 0);
        history.insert('b', 1);
        history.insert('c', 2);
        let empty = Itemset::<char>::new();
        let a = Itemset::from_iter(['a']);
        let ac = Itemset::from_iter(['a', 'c']);
        assert_eq!(empty.history_cmp(&a, &history), Ordering::Less);
        assert_eq!(a.history_cmp(&ac, &history), Ordering::Less);
        assert_eq!(a.history_cmp(&a, &history), Ordering::Equal);
    }
}
