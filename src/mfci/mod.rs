//! MFCI (Mining Frequent Closed Itemsets) engine.
//!
//! A closed-itemset DAG (`ContentTable`) with an item index (`ItemTable`)
//! and a per-`add` scratch structure (`TempTable`) that collects candidate
//! intersections of the incoming transaction with every existing closed
//! itemset (spec §3.3, §4.3). Where the teacher's FP-tree grows a single
//! structure per transaction, MFCI maintains an explicit DAG of immediate
//! closed-sub/superset edges, realized here with the same arena-by-id
//! approach as [`crate::diu`] (`Cid` standing in for `NodeId`).

mod content_table;
mod item_table;
mod temp_table;

use std::collections::HashSet;

use tracing::trace;

pub use content_table::{Cid, ContentTable, Entry};
pub use item_table::ItemTable;
pub use temp_table::TempEntry;

use crate::engine::SlidingWindowAlgorithm;
use crate::error::{MiningError, Result};
use crate::{Itemset, ItemType};

/// Closed-itemset DAG engine. See module docs.
pub struct MfciEngine<T: ItemType> {
    content: ContentTable<T>,
    items: ItemTable<T>,
}

impl<T: ItemType> Default for MfciEngine<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ItemType> MfciEngine<T> {
    pub fn new() -> Self {
        MfciEngine {
            content: ContentTable::new(),
            items: ItemTable::new(),
        }
    }

    /// `generateClosedItemsets` (spec §4.3.1): one candidate per distinct
    /// intersection of `x` with an existing closed itemset, largest first.
    fn generate_closed_itemsets(&self, x: &Itemset<T>) -> Vec<TempEntry<T>> {
        let mut entries: Vec<TempEntry<T>> = Vec::new();
        let mut index_of_cid: Vec<(Cid, usize)> = Vec::new();

        for &item in x.iter() {
            for &cid in self.items.cids_for(&item) {
                if let Some(&(_, idx)) = index_of_cid.iter().find(|(c, _)| *c == cid) {
                    entries[idx].itemset.insert(item);
                } else {
                    let support = self.content.get(cid).map(|e| e.support).unwrap_or(0);
                    let idx = entries.len();
                    entries.push(TempEntry {
                        closure_id: Some(cid),
                        itemset: Itemset::from_iter([item]),
                        status: 0,
                        support,
                        cid: None,
                    });
                    index_of_cid.push((cid, idx));
                }
            }
        }

        entries.sort_by(|a, b| {
            b.itemset
                .len()
                .cmp(&a.itemset.len())
                .then_with(|| a.itemset.lex_cmp(&b.itemset))
        });

        let mut merged: Vec<TempEntry<T>> = Vec::new();
        for e in entries {
            match merged.iter_mut().find(|m: &&mut TempEntry<T>| m.itemset == e.itemset) {
                Some(existing) if e.support > existing.support => *existing = e,
                Some(_) => {}
                None => merged.push(e),
            }
        }
        merged
    }
}

impl<T: ItemType> SlidingWindowAlgorithm<T> for MfciEngine<T> {
    fn add(&mut self, x: Itemset<T>) -> Result<()> {
        if x.is_empty() {
            return Err(MiningError::InvariantViolation(
                "add() requires a non-empty itemset".to_string(),
            ));
        }
        let closure_flag = self.content.find_by_itemset(&x).is_some();
        let mut temp = self.generate_closed_itemsets(&x);

        for e in temp.iter_mut() {
            let closure_cid = e
                .closure_id
                .expect("generate_closed_itemsets entries always carry a closure_id");
            let (closure_itemset, closure_support) = {
                let closure_entry = self.content.get(closure_cid).expect("closure cid must exist");
                (closure_entry.itemset.clone(), closure_entry.support)
            };
            if e.itemset != closure_itemset {
                let f_cid = self.content.insert(e.itemset.clone(), closure_support + 1);
                self.items.register(&e.itemset, f_cid);
                e.cid = Some(f_cid);
                e.support = closure_support + 1;
            } else {
                self.content.get_mut(closure_cid).unwrap().support = closure_support + 1;
                e.cid = Some(closure_cid);
                e.support = closure_support + 1;
            }
        }

        if !temp.iter().any(|e| e.itemset == x) {
            let cid = self.content.insert(x.clone(), 1);
            self.items.register(&x, cid);
            temp.insert(
                0,
                TempEntry {
                    closure_id: None,
                    itemset: x.clone(),
                    status: 0,
                    support: 1,
                    cid: Some(cid),
                },
            );
        }

        if closure_flag {
            // Deviation kept deliberately (spec §9): when the transaction
            // was already a closed itemset, skip further DAG maintenance.
            return Ok(());
        }

        // processAdd (spec §4.3.3), simplified: link every pair of temp
        // entries whose itemsets are in a strict superset relation; the
        // self-pruning `link_immediate` keeps only genuinely immediate
        // edges regardless of pair visitation order.
        temp.sort_by(|a, b| {
            b.itemset
                .len()
                .cmp(&a.itemset.len())
                .then_with(|| a.itemset.lex_cmp(&b.itemset))
        });
        for i in 0..temp.len() {
            for j in (i + 1)..temp.len() {
                if temp[i].itemset.strictly_contains(&temp[j].itemset) {
                    let sup = temp[i].cid.unwrap();
                    let sub = temp[j].cid.unwrap();
                    self.content.link_immediate(sub, sup);
                }
            }
        }
        trace!(?x, "MFCI: add complete");
        Ok(())
    }

    fn delete(&mut self, x: &Itemset<T>) -> Result<()> {
        let e_cid = self
            .content
            .find_by_itemset(x)
            .ok_or_else(|| MiningError::NotInWindow(format!("{:?}", x)))?;

        let u = self.content.transitive_closed_subsets(e_cid);
        for &cid in &u {
            if let Some(entry) = self.content.get_mut(cid) {
                entry.support -= 1;
            }
        }

        let mut rest: Vec<Cid> = u.into_iter().filter(|&c| c != e_cid).collect();
        rest.sort_by(|&a, &b| {
            self.content
                .itemset_of(b)
                .len()
                .cmp(&self.content.itemset_of(a).len())
        });

        let mut visited: HashSet<Cid> = HashSet::new();
        for cid in rest {
            if visited.contains(&cid) || self.content.get(cid).is_none() {
                continue;
            }
            self.process_delete(cid, &mut visited);
        }
        trace!(?x, "MFCI: delete complete");
        Ok(())
    }

    fn support(&self, x: &Itemset<T>) -> usize {
        self.content
            .entries()
            .filter(|e| e.itemset.contains(x))
            .min_by_key(|e| e.itemset.len())
            .map(|e| e.support)
            .unwrap_or(0)
    }

    fn closed_itemsets(&self) -> Vec<Itemset<T>> {
        self.content.entries().map(|e| e.itemset.clone()).collect()
    }

    fn closed_frequent(&self, t: usize) -> Vec<Itemset<T>> {
        self.content
            .entries()
            .filter(|e| e.support >= t)
            .map(|e| e.itemset.clone())
            .collect()
    }
}

impl<T: ItemType> MfciEngine<T> {
    /// `processDelete` (spec §4.3.5).
    fn process_delete(&mut self, s: Cid, visited: &mut HashSet<Cid>) {
        let support = match self.content.get(s) {
            Some(e) => e.support,
            None => return,
        };

        if support == 0 {
            let subsets = self.content.get(s).unwrap().immediate_closed_subsets.clone();
            let itemset = self.content.itemset_of(s);
            self.content.remove(s);
            self.items.unregister(&itemset, s);
            for r in subsets {
                self.process_delete(r, visited);
            }
            return;
        }

        let supersets = self.content.get(s).unwrap().immediate_closed_supersets.clone();
        if supersets.len() == 1 {
            let y = supersets[0];
            let y_support = self.content.get(y).map(|e| e.support).unwrap_or(usize::MAX);
            if support == y_support {
                let subsets = self.content.get(s).unwrap().immediate_closed_subsets.clone();
                for &r in &subsets {
                    if !self.content.has_path(r, y) {
                        self.content.link_immediate(r, y);
                    }
                }
                let itemset = self.content.itemset_of(s);
                self.content.remove(s);
                self.items.unregister(&itemset, s);
                for r in subsets {
                    self.process_delete(r, visited);
                }
                return;
            }
        }

        let closure = self.content.transitive_closed_subsets(s);
        visited.extend(closure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(items: &[i32]) -> Itemset<i32> {
        Itemset::from_iter(items.iter().copied())
    }

    #[test]
    fn immediate_dag_transitivity() {
        let mut engine = MfciEngine::<i32>::new();
        for t in [vec![1, 2, 3], vec![1, 2], vec![1, 2, 3]] {
            engine.add(txn(&t)).unwrap();
        }
        // {1,2,3} must be reachable as a (possibly transitive) closed
        // subset chain from the full content table, and every closed
        // itemset must in fact be closed: no strict superset shares its
        // support.
        for e in engine.content.entries() {
            for other in engine.content.entries() {
                if other.itemset.strictly_contains(&e.itemset) {
                    assert_ne!(other.support, e.support);
                }
            }
        }
    }

    #[test]
    fn delete_unknown_itemset_errors() {
        let mut engine = MfciEngine::<i32>::new();
        engine.add(txn(&[1])).unwrap();
        assert!(engine.delete(&txn(&[9])).is_err());
    }

    #[test]
    fn support_of_closure() {
        let mut engine = MfciEngine::<i32>::new();
        engine.add(txn(&[1, 2, 3])).unwrap();
        engine.add(txn(&[1, 2, 3])).unwrap();
        // {1} isn't itself closed (its closure is {1,2,3}), so support(1)
        // must report the closure's support.
        assert_eq!(engine.support(&txn(&[1])), 2);
    }
}
