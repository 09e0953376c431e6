//! `ContentTable`: the closed-itemset DAG (spec §3.3, §4.3.3).

use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

use crate::{Itemset, ItemType};

/// Identifier of a [`Entry`] in a [`ContentTable`]. Assigned once and never
/// reused, even after the entry is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cid(pub(crate) u32);

#[derive(Debug, Clone)]
pub struct Entry<T: ItemType> {
    pub cid: Cid,
    pub itemset: Itemset<T>,
    pub support: usize,
    pub immediate_closed_subsets: Vec<Cid>,
    pub immediate_closed_supersets: Vec<Cid>,
}

/// `cid -> Entry` lookup kept in insertion order (spec §3.3), plus an
/// itemset index so `add`/`delete` can find an itemset's entry without a
/// linear scan — the same role the teacher's `routes` map plays for items.
#[derive(Default)]
pub struct ContentTable<T: ItemType> {
    entries: IndexMap<Cid, Entry<T>>,
    by_itemset: HashMap<Itemset<T>, Cid>,
    next_cid: u32,
}

impl<T: ItemType> ContentTable<T> {
    pub fn new() -> Self {
        ContentTable {
            entries: IndexMap::new(),
            by_itemset: HashMap::new(),
            next_cid: 0,
        }
    }

    pub fn find_by_itemset(&self, itemset: &Itemset<T>) -> Option<Cid> {
        self.by_itemset.get(itemset).copied()
    }

    pub fn get(&self, cid: Cid) -> Option<&Entry<T>> {
        self.entries.get(&cid)
    }

    pub fn get_mut(&mut self, cid: Cid) -> Option<&mut Entry<T>> {
        self.entries.get_mut(&cid)
    }

    pub fn itemset_of(&self, cid: Cid) -> Itemset<T> {
        self.entries
            .get(&cid)
            .map(|e| e.itemset.clone())
            .unwrap_or_else(Itemset::new)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry<T>> {
        self.entries.values()
    }

    /// Allocate a new entry for `itemset` with the given support. The caller
    /// is responsible for registering the itemset's items into the item
    /// table and for linking the entry into the DAG.
    pub fn insert(&mut self, itemset: Itemset<T>, support: usize) -> Cid {
        let cid = Cid(self.next_cid);
        self.next_cid += 1;
        self.by_itemset.insert(itemset.clone(), cid);
        self.entries.insert(
            cid,
            Entry {
                cid,
                itemset,
                support,
                immediate_closed_subsets: Vec::new(),
                immediate_closed_supersets: Vec::new(),
            },
        );
        cid
    }

    /// Remove an entry entirely, unlinking it from every neighbor's
    /// immediate sub/superset lists.
    pub fn remove(&mut self, cid: Cid) {
        let Some(entry) = self.entries.shift_remove(&cid) else {
            return;
        };
        self.by_itemset.remove(&entry.itemset);
        for &sup in &entry.immediate_closed_supersets {
            if let Some(e) = self.entries.get_mut(&sup) {
                e.immediate_closed_subsets.retain(|&c| c != cid);
            }
        }
        for &sub in &entry.immediate_closed_subsets {
            if let Some(e) = self.entries.get_mut(&sub) {
                e.immediate_closed_supersets.retain(|&c| c != cid);
            }
        }
    }

    /// `addImmediateClosedSub/Superset` (spec §4.3.3): link `sub` as an
    /// immediate closed subset of `sup`, dropping any edges that the new
    /// link makes non-immediate, and skipping the link entirely if an
    /// existing intermediate entry already sits between them.
    pub fn link_immediate(&mut self, sub: Cid, sup: Cid) {
        if sub == sup {
            return;
        }
        let sub_itemset = self.itemset_of(sub);
        let sup_itemset = self.itemset_of(sup);
        if !sup_itemset.strictly_contains(&sub_itemset) {
            return;
        }

        let already_intermediate = self
            .get(sub)
            .map(|e| {
                e.immediate_closed_supersets.iter().any(|&s| {
                    s != sup && self.itemset_of(s).strictly_contains(&sub_itemset)
                        && sup_itemset.strictly_contains(&self.itemset_of(s))
                })
            })
            .unwrap_or(false);
        if already_intermediate {
            return;
        }

        // Drop now-non-immediate edges: an existing immediate superset of
        // `sub` that itself is a (strict) superset of `sup` is no longer
        // immediate once `sup` sits between them.
        if let Some(e) = self.get(sub).cloned() {
            for &s in &e.immediate_closed_supersets {
                if s != sup && self.itemset_of(s).strictly_contains(&sup_itemset) {
                    self.unlink(sub, s);
                }
            }
        }
        // Symmetric: an existing immediate subset of `sup` that is a
        // (strict) subset of `sub` is no longer immediate.
        if let Some(e) = self.get(sup).cloned() {
            for &q in &e.immediate_closed_subsets {
                if q != sub && sub_itemset.strictly_contains(&self.itemset_of(q)) {
                    self.unlink(q, sup);
                }
            }
        }

        if let Some(e) = self.get_mut(sub) {
            if !e.immediate_closed_supersets.contains(&sup) {
                e.immediate_closed_supersets.push(sup);
            }
        }
        if let Some(e) = self.get_mut(sup) {
            if !e.immediate_closed_subsets.contains(&sub) {
                e.immediate_closed_subsets.push(sub);
            }
        }
    }

    fn unlink(&mut self, sub: Cid, sup: Cid) {
        if let Some(e) = self.get_mut(sub) {
            e.immediate_closed_supersets.retain(|&c| c != sup);
        }
        if let Some(e) = self.get_mut(sup) {
            e.immediate_closed_subsets.retain(|&c| c != sub);
        }
    }

    /// `e` together with every entry transitively reachable through
    /// `immediate_closed_subsets`.
    pub fn transitive_closed_subsets(&self, e: Cid) -> Vec<Cid> {
        let mut seen = HashSet::new();
        let mut stack = vec![e];
        let mut out = Vec::new();
        while let Some(cid) = stack.pop() {
            if !seen.insert(cid) {
                continue;
            }
            out.push(cid);
            if let Some(entry) = self.get(cid) {
                for &s in &entry.immediate_closed_subsets {
                    stack.push(s);
                }
            }
        }
        out
    }

    /// `hasPath` (spec §4.3.5): DFS over `immediate_closed_supersets`
    /// looking for `to`.
    pub fn has_path(&self, from: Cid, to: Cid) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![from];
        while let Some(cid) = stack.pop() {
            if cid == to {
                return true;
            }
            if !seen.insert(cid) {
                continue;
            }
            if let Some(entry) = self.get(cid) {
                for &s in &entry.immediate_closed_supersets {
                    stack.push(s);
                }
            }
        }
        false
    }
}
