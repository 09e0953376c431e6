//! StreamFCI: closed frequent itemset mining via a dynamic FP-tree (DFP
//! tree) that keeps every root-to-node path sorted by descending item
//! support, repairing the order in place as supports shift (spec §3.4,
//! §4.4). Closest in spirit to the teacher's own `FPTree`, but the teacher's
//! tree only ever grows; here nodes are deleted, reparented and swapped, so
//! the same arena-by-id representation used by [`crate::diu`] and
//! [`crate::mfci`] replaces the teacher's `Rc`/`Weak` links.
//!
//! `support` here is the known-fixed version (spec §9, §11): rather than
//! walking a single path, it counts, for the rarest item in the query, every
//! occurrence whose ancestor path is a superset of the query — the standard
//! conditional-pattern-base count. Closed itemsets are derived from the tree
//! by taking every distinct root-to-node path as a candidate, closing the
//! candidate pool under pairwise intersection, then keeping only the
//! candidates with no strict superset of equal support (spec §11: the
//! `FCITable` stub is not reproduced).

mod dfp_tree;

use std::collections::HashMap;

use tracing::{trace, warn};

use dfp_tree::{DfpTree, NodeId, ROOT};

use crate::engine::SlidingWindowAlgorithm;
use crate::error::{MiningError, Result};
use crate::{Itemset, ItemType};

pub struct StreamFciEngine<T: ItemType> {
    tree: DfpTree<T>,
}

impl<T: ItemType> Default for StreamFciEngine<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ItemType> StreamFciEngine<T> {
    pub fn new() -> Self {
        StreamFciEngine { tree: DfpTree::new() }
    }

    fn all_node_ids(&self) -> Vec<NodeId> {
        self.tree
            .arena
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| NodeId(i)))
            .collect()
    }

    fn node_path_itemset(&self, node: NodeId) -> Itemset<T> {
        let mut items = Vec::new();
        let mut cur = node;
        loop {
            let n = self.tree.node(cur);
            match n.item {
                Some(item) => items.push(item),
                None => break,
            }
            cur = n.parent.expect("non-root node always has a parent");
        }
        Itemset::from_iter(items)
    }

    /// Conditional-pattern-base support count: walk every occurrence of the
    /// least-supported item in `x` and count those whose ancestor path is a
    /// superset of `x` (this is the fix for the known single-path bug).
    fn support_of(&self, x: &Itemset<T>) -> usize {
        let bottleneck = match x.iter().copied().min_by_key(|it| self.tree.header_support(it)) {
            Some(item) => item,
            None => return 0,
        };
        let mut total = 0;
        for node in self.tree.chain(&bottleneck) {
            let path = self.node_path_itemset(node);
            if path.contains(x) {
                total += self.tree.node(node).count;
            }
        }
        total
    }

    fn closed_pool(&self) -> Vec<(Itemset<T>, usize)> {
        let mut pool: Vec<(Itemset<T>, usize)> = Vec::new();
        for id in self.all_node_ids() {
            if self.tree.node(id).item.is_none() {
                continue;
            }
            let path = self.node_path_itemset(id);
            if pool.iter().any(|(x, _)| *x == path) {
                continue;
            }
            let support = self.support_of(&path);
            pool.push((path, support));
        }

        loop {
            let mut added: Vec<(Itemset<T>, usize)> = Vec::new();
            for i in 0..pool.len() {
                for j in (i + 1)..pool.len() {
                    let inter = pool[i].0.intersection(&pool[j].0);
                    if inter.is_empty() {
                        continue;
                    }
                    let known = pool.iter().any(|(x, _)| *x == inter)
                        || added.iter().any(|(x, _)| *x == inter);
                    if known {
                        continue;
                    }
                    let support = self.support_of(&inter);
                    added.push((inter, support));
                }
            }
            if added.is_empty() {
                break;
            }
            pool.extend(added);
        }

        let keep: Vec<bool> = pool
            .iter()
            .map(|(x, support)| {
                !pool
                    .iter()
                    .any(|(y, support2)| support2 == support && y.strictly_contains(x))
            })
            .collect();
        let mut idx = 0;
        pool.retain(|_| {
            let k = keep[idx];
            idx += 1;
            k
        });
        pool
    }

    fn find_inverse_pair(&self) -> Option<(NodeId, NodeId, NodeId)> {
        for y in self.all_node_ids() {
            let x = match self.tree.node(y).parent {
                Some(p) => p,
                None => continue,
            };
            if x == ROOT {
                continue;
            }
            let w = self
                .tree
                .node(x)
                .parent
                .expect("non-root node always has a parent");
            let x_item = self.tree.node(x).item.unwrap();
            let y_item = self.tree.node(y).item.unwrap();
            let sx = self.tree.header_support(&x_item);
            let sy = self.tree.header_support(&y_item);
            if sy > sx || (sy == sx && y_item < x_item) {
                return Some((w, x, y));
            }
        }
        None
    }

    /// `adjust` (spec §4.4.3): repeatedly swap an inverse pair until every
    /// root-to-node path is sorted by descending support.
    fn adjust(&mut self) {
        let n = self.tree.arena.len();
        let cap = n.saturating_mul(n) + 64;
        let mut iterations = 0usize;
        while let Some((w, x, y)) = self.find_inverse_pair() {
            self.swap(w, x, y);
            iterations += 1;
            if iterations > cap {
                warn!("StreamFCI: adjust exceeded its iteration cap, stopping defensively");
                break;
            }
        }
    }

    /// Swap the inverse pair `(x, y)` under common ancestor `w` (spec
    /// §4.4.3): `x` is `y`'s parent and violates the support order, so `y`
    /// is promoted above `x`.
    fn swap(&mut self, w: NodeId, x: NodeId, y: NodeId) {
        let x_item = self.tree.node(x).item.unwrap();
        let y_item = self.tree.node(y).item.unwrap();
        let y_count = self.tree.node(y).count;

        let v = self.tree.alloc(x_item, y_count, y);
        let moved_children = std::mem::take(&mut self.tree.node_mut(y).children);
        for &child in moved_children.values() {
            self.tree.node_mut(child).parent = Some(v);
        }
        self.tree.node_mut(v).children = moved_children;
        self.tree.link_existing_node(x_item, v);

        self.tree.node_mut(x).children.remove(&y_item);
        let mut new_children = HashMap::new();
        new_children.insert(x_item, v);
        self.tree.node_mut(y).children = new_children;
        self.tree.node_mut(y).parent = Some(w);

        self.tree.node_mut(x).count -= y_count;
        if self.tree.node(x).count == 0 {
            self.tree.node_mut(w).children.remove(&x_item);
            self.tree.unlink_node(x_item, x);
            self.tree.free(x);
        }

        self.merge(w, y);
    }

    /// Attach `node` under `target`, merging it into an existing child that
    /// shares its item rather than creating a duplicate sibling (spec
    /// §4.4.4).
    fn merge(&mut self, target: NodeId, node: NodeId) {
        let item = self.tree.node(node).item.expect("merge never called on root");
        match self.tree.node(target).children.get(&item).copied() {
            Some(existing) => {
                let node_count = self.tree.node(node).count;
                self.tree.node_mut(existing).count += node_count;
                self.tree.unlink_node(item, node);
                let children: Vec<NodeId> = self.tree.node(node).children.values().copied().collect();
                for child in children {
                    self.merge(existing, child);
                }
                self.tree.free(node);
            }
            None => {
                self.tree.node_mut(node).parent = Some(target);
                self.tree.node_mut(target).children.insert(item, node);
            }
        }
    }

    fn remove_zero_count_node(&mut self, node_id: NodeId) {
        let item = self.tree.node(node_id).item.expect("never called on root");
        self.tree.unlink_node(item, node_id);
        let parent = self
            .tree
            .node(node_id)
            .parent
            .expect("non-root node always has a parent");
        self.tree.node_mut(parent).children.remove(&item);
        let children: Vec<NodeId> = self.tree.node(node_id).children.values().copied().collect();
        for child in children {
            self.merge(parent, child);
        }
        self.tree.free(node_id);
    }
}

impl<T: ItemType> SlidingWindowAlgorithm<T> for StreamFciEngine<T> {
    fn add(&mut self, x: Itemset<T>) -> Result<()> {
        if x.is_empty() {
            return Err(MiningError::InvariantViolation(
                "add() requires a non-empty itemset".to_string(),
            ));
        }
        let ordered = self.tree.order_items(&x);
        let mut cur = ROOT;
        for item in ordered {
            match self.tree.node(cur).children.get(&item).copied() {
                Some(child) => {
                    self.tree.node_mut(child).count += 1;
                    cur = child;
                }
                None => {
                    let new_id = self.tree.alloc(item, 1, cur);
                    self.tree.node_mut(cur).children.insert(item, new_id);
                    self.tree.link_new_node(item, new_id);
                    cur = new_id;
                }
            }
            if let Some(h) = self.tree.headers.get_mut(&item) {
                h.support += 1;
            }
        }
        self.adjust();
        trace!(?x, "StreamFCI: add complete");
        Ok(())
    }

    fn delete(&mut self, x: &Itemset<T>) -> Result<()> {
        let ordered = self.tree.order_items(x);
        let mut cur = ROOT;
        let mut path: Vec<(NodeId, T)> = Vec::new();
        for item in ordered {
            let child = self
                .tree
                .node(cur)
                .children
                .get(&item)
                .copied()
                .ok_or_else(|| MiningError::NotInWindow(format!("{:?}", x)))?;
            path.push((child, item));
            cur = child;
        }

        for &(node_id, item) in &path {
            self.tree.node_mut(node_id).count -= 1;
            let mut emptied = false;
            if let Some(h) = self.tree.headers.get_mut(&item) {
                h.support -= 1;
                emptied = h.support == 0;
            }
            if emptied {
                self.tree.headers.remove(&item);
            }
        }

        for &(node_id, _) in path.iter().rev() {
            if self.tree.node(node_id).count == 0 {
                self.remove_zero_count_node(node_id);
            }
        }

        self.adjust();
        trace!(?x, "StreamFCI: delete complete");
        Ok(())
    }

    fn support(&self, x: &Itemset<T>) -> usize {
        self.support_of(x)
    }

    fn closed_itemsets(&self) -> Vec<Itemset<T>> {
        self.closed_pool().into_iter().map(|(x, _)| x).collect()
    }

    fn closed_frequent(&self, t: usize) -> Vec<Itemset<T>> {
        self.closed_pool()
            .into_iter()
            .filter(|(_, support)| *support >= t)
            .map(|(x, _)| x)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(items: &[i32]) -> Itemset<i32> {
        Itemset::from_iter(items.iter().copied())
    }

    #[test]
    fn support_fix_counts_non_prefix_subsets() {
        let mut engine = StreamFciEngine::<i32>::new();
        // {1,2} will be the high-support pair, {1,3} the low-support one;
        // 3 never forms a contiguous prefix with 1 once 2 outranks it.
        for _ in 0..3 {
            engine.add(txn(&[1, 2])).unwrap();
        }
        engine.add(txn(&[1, 3])).unwrap();
        assert_eq!(engine.support(&txn(&[1])), 4);
        assert_eq!(engine.support(&txn(&[1, 2])), 3);
        assert_eq!(engine.support(&txn(&[1, 3])), 1);
    }

    #[test]
    fn delete_is_inverse_of_add() {
        let mut engine = StreamFciEngine::<i32>::new();
        engine.add(txn(&[1, 2, 3])).unwrap();
        engine.add(txn(&[1, 2])).unwrap();
        engine.add(txn(&[1, 2, 3])).unwrap();
        engine.delete(&txn(&[1, 2, 3])).unwrap();
        assert_eq!(engine.support(&txn(&[1, 2, 3])), 1);
        assert_eq!(engine.support(&txn(&[1, 2])), 2);
    }

    #[test]
    fn delete_unknown_itemset_errors() {
        let mut engine = StreamFciEngine::<i32>::new();
        engine.add(txn(&[1, 2])).unwrap();
        assert!(engine.delete(&txn(&[9])).is_err());
    }

    #[test]
    fn closed_itemsets_are_actually_closed() {
        let mut engine = StreamFciEngine::<i32>::new();
        for t in [vec![1, 2, 3], vec![1, 2], vec![1, 2, 3], vec![2, 3]] {
            engine.add(txn(&t)).unwrap();
        }
        let closed = engine.closed_itemsets();
        for c in &closed {
            let sc = engine.support(c);
            for other in &closed {
                if other.strictly_contains(c) {
                    assert_ne!(engine.support(other), sc);
                }
            }
        }
    }

    #[test]
    fn adjust_keeps_every_path_sorted_by_descending_support() {
        let mut engine = StreamFciEngine::<i32>::new();
        // Insert 3 before 1 so that 3's support briefly outranks 1's, then
        // tip the balance back: adjust must keep re-sorting root paths.
        engine.add(txn(&[3])).unwrap();
        engine.add(txn(&[3])).unwrap();
        engine.add(txn(&[1, 3])).unwrap();
        engine.add(txn(&[1, 3])).unwrap();
        engine.add(txn(&[1])).unwrap();
        for id in engine.all_node_ids() {
            let node = engine.tree.node(id);
            if let Some(parent) = node.parent {
                if parent != ROOT {
                    let p = engine.tree.node(parent);
                    let p_item = p.item.unwrap();
                    let c_item = node.item.unwrap();
                    let ps = engine.tree.header_support(&p_item);
                    let cs = engine.tree.header_support(&c_item);
                    assert!(ps > cs || (ps == cs && p_item < c_item));
                }
            }
        }
    }
}
