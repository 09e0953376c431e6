//! DIU (Direct Update Tree) engine.
//!
//! A tree of closed itemsets keyed by occurrence order, updated in place as
//! transactions are added to and aged out of the window (spec §3.2, §4.2).
//! Structurally this plays the same role as the teacher's `Tree<T>`
//! (`src/tree.rs`): a rooted tree with a per-item index for fast lookup of
//! related nodes (the teacher's `routes`, here `index` plus `history`). The
//! teacher never deletes nodes, so it can afford `Rc`/`Weak`/`RefCell`; DIU's
//! `delete` reparents and removes nodes in place, so this engine instead uses
//! an arena of [`node::Node`]s addressed by [`node::NodeId`] (spec §9).

mod node;

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use tracing::trace;

use self::node::{Node, NodeId, ROOT};
use crate::engine::SlidingWindowAlgorithm;
use crate::error::{MiningError, Result};
use crate::{Itemset, ItemType};

struct PendingNode<T: ItemType> {
    itemset: Itemset<T>,
    support: usize,
    count: usize,
}

/// Closure-tree engine. See module docs.
pub struct DiuEngine<T: ItemType> {
    arena: Vec<Option<Node<T>>>,
    index: HashMap<Itemset<T>, NodeId>,
    /// First-seen rank of every item ever observed. Monotonically growing;
    /// items are never removed even once their support drops to zero, so
    /// history order stays stable (spec §9 "History map" design note).
    history: HashMap<T, u32>,
    next_item_id: u32,
}

impl<T: ItemType> Default for DiuEngine<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ItemType> DiuEngine<T> {
    pub fn new() -> Self {
        DiuEngine {
            arena: vec![Some(Node::root())],
            index: HashMap::new(),
            history: HashMap::new(),
            next_item_id: 0,
        }
    }

    /// Every item that has appeared in the window at least once (spec
    /// property 7: history completeness).
    pub fn history(&self) -> &HashMap<T, u32> {
        &self.history
    }

    fn node(&self, id: NodeId) -> &Node<T> {
        self.arena[id.0].as_ref().expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        self.arena[id.0].as_mut().expect("dangling NodeId")
    }

    fn itemset_of(&self, id: NodeId) -> Itemset<T> {
        self.node(id)
            .itemset
            .clone()
            .unwrap_or_else(Itemset::new)
    }

    fn all_node_ids(&self) -> Vec<NodeId> {
        self.arena
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|_| NodeId(i)))
            .filter(|&id| id != ROOT)
            .collect()
    }

    fn register_history(&mut self, x: &Itemset<T>) {
        for &item in x.iter() {
            self.history.entry(item).or_insert_with(|| {
                let id = self.next_item_id;
                self.next_item_id += 1;
                id
            });
        }
    }

    /// Sum of `support` over every *immediate* superset of `x` in the tree
    /// (spec §3.2 invariant 5 / §4.2.1 step 3).
    fn support_if_not_contained(&self, x: &Itemset<T>) -> usize {
        self.immediate_supersets(x)
            .into_iter()
            .map(|id| self.node(id).support)
            .sum()
    }

    /// Nodes whose itemset strictly contains `x`, with no other such node
    /// strictly between them and `x`.
    fn immediate_supersets(&self, x: &Itemset<T>) -> Vec<NodeId> {
        let supersets: Vec<NodeId> = self
            .all_node_ids()
            .into_iter()
            .filter(|&id| self.itemset_of(id).strictly_contains(x))
            .collect();
        supersets
            .iter()
            .copied()
            .filter(|&id| {
                let is = self.itemset_of(id);
                !supersets
                    .iter()
                    .any(|&other| other != id && is.strictly_contains(&self.itemset_of(other)))
            })
            .collect()
    }

    /// A minimum-size existing node whose itemset is a superset of (or equal
    /// to) `x`, used by the add-side closure check (spec §4.2.1 step 5).
    fn minimum_size_superset(&self, x: &Itemset<T>) -> Option<NodeId> {
        self.all_node_ids()
            .into_iter()
            .filter(|&id| self.itemset_of(id).contains(x))
            .min_by_key(|&id| self.itemset_of(id).len())
    }

    /// `candidatesInDescendingLength` (spec §4.2.3): intersections of `x`
    /// with tree itemsets reached by a pruned DFS from the root.
    fn candidates_in_descending_length(&self, x: &Itemset<T>) -> Vec<Itemset<T>> {
        let mut found = Vec::new();
        self.collect_candidates(ROOT, x, &mut found);
        let mut seen = HashSet::new();
        let mut out: Vec<Itemset<T>> = found
            .into_iter()
            .filter(|c| !c.is_empty() && seen.insert(c.clone()))
            .collect();
        out.sort_by(|a, b| b.len().cmp(&a.len()));
        out
    }

    fn collect_candidates(&self, parent: NodeId, x: &Itemset<T>, out: &mut Vec<Itemset<T>>) {
        for &child in &self.node(parent).children {
            if self.can_prune(parent, child, x) {
                break;
            }
            let child_itemset = self.itemset_of(child);
            let inter = child_itemset.intersection(x);
            if !inter.is_empty() {
                out.push(inter);
            }
            self.collect_candidates(child, x, out);
        }
    }

    fn can_prune(&self, parent: NodeId, child: NodeId, x: &Itemset<T>) -> bool {
        let p = self.itemset_of(parent).intersection(x);
        let max_x = x
            .iter()
            .filter(|i| !p.contains_item(i))
            .map(|i| self.history[i])
            .max();
        let child_itemset = self.itemset_of(child);
        let min_y = child_itemset
            .iter()
            .filter(|i| !p.contains_item(i))
            .map(|i| self.history[i])
            .min();
        match (max_x, min_y) {
            (Some(mx), Some(my)) => mx < my,
            _ => false,
        }
    }

    /// `closureCheckForAdd` (spec §4.2.1 step 5): pass iff no item of
    /// `M \ c` (M the minimum-size existing superset of `c`) is present in
    /// `x0`, the itemset of the transaction currently being added.
    fn closure_check_for_add(&self, c: &Itemset<T>, x0: &Itemset<T>) -> bool {
        match self.minimum_size_superset(c) {
            None => true,
            Some(m_id) => {
                let m = self.itemset_of(m_id);
                m.iter()
                    .filter(|i| !c.contains_item(i))
                    .all(|i| !x0.contains_item(i))
            }
        }
    }

    fn propagate_candidate(
        &mut self,
        c: Itemset<T>,
        x0: &Itemset<T>,
        new_nodes: &mut Vec<PendingNode<T>>,
    ) {
        if let Some(&cid) = self.index.get(&c) {
            self.node_mut(cid).support += 1;
            return;
        }
        let sup_c = self.support_if_not_contained(&c);
        if sup_c > 0 {
            if self.closure_check_for_add(&c, x0) {
                trace!(?c, "DIU: closure check passed, scheduling new node");
                new_nodes.push(PendingNode {
                    itemset: c,
                    support: sup_c + 1,
                    count: 0,
                });
            }
        } else {
            // Per spec: only reachable for the seed itemset, never through
            // this recursive path, since every candidate here is an
            // intersection with an existing node and therefore always has
            // at least that node's support. Handled defensively anyway.
            new_nodes.push(PendingNode {
                itemset: c,
                support: 1,
                count: 0,
            });
        }
    }

    fn find_insertion_parent(&self, n_itemset: &Itemset<T>) -> NodeId {
        let mut best = ROOT;
        let mut best_size = 0usize;
        for id in self.all_node_ids() {
            let p = self.itemset_of(id);
            if n_itemset.strictly_contains(&p)
                && p.history_cmp(n_itemset, &self.history) != Ordering::Greater
                && p.len() > best_size
            {
                best = id;
                best_size = p.len();
            }
        }
        best
    }

    fn insert_child_sorted(&mut self, parent: NodeId, child: NodeId) {
        let child_itemset = self.itemset_of(child);
        let siblings = self.node(parent).children.clone();
        let mut pos = siblings.len();
        for (i, &sib) in siblings.iter().enumerate() {
            let sib_itemset = self.itemset_of(sib);
            if child_itemset.history_cmp(&sib_itemset, &self.history) == Ordering::Less {
                pos = i;
                break;
            }
        }
        self.node_mut(parent).children.insert(pos, child);
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(parent).children.retain(|&c| c != child);
    }

    fn alloc_node(&mut self, itemset: Itemset<T>, support: usize, count: usize, parent: NodeId) -> NodeId {
        let node = Node::new(itemset, support, count, parent);
        self.arena.push(Some(node));
        NodeId(self.arena.len() - 1)
    }

    /// `insertNode` (spec §4.2.2).
    fn insert_node(&mut self, pending: PendingNode<T>) {
        if let Some(&existing) = self.index.get(&pending.itemset) {
            // Already present (e.g. created twice within the same add via
            // two different candidate paths before insertion); fold in.
            self.node_mut(existing).support += pending.support;
            self.node_mut(existing).count += pending.count;
            return;
        }
        let parent = self.find_insertion_parent(&pending.itemset);
        let new_id = self.alloc_node(pending.itemset.clone(), pending.support, pending.count, parent);

        let siblings = self.node(parent).children.clone();
        let reparent: Vec<NodeId> = siblings
            .into_iter()
            .filter(|&c| {
                let c_itemset = self.itemset_of(c);
                c_itemset.strictly_contains(&pending.itemset)
                    && pending
                        .itemset
                        .history_cmp(&c_itemset, &self.history)
                        == Ordering::Less
            })
            .collect();

        for child in reparent {
            self.remove_child(parent, child);
            self.node_mut(child).parent = Some(new_id);
            self.insert_child_sorted(new_id, child);
        }
        self.insert_child_sorted(parent, new_id);
        self.index.insert(pending.itemset, new_id);
    }

    /// `restructure` used by `delete`: splice `removed` out, reparenting its
    /// children under its former parent, using the same ordered-insert rule
    /// as `insertNode`.
    fn remove_node_reparenting(&mut self, removed: NodeId) {
        let parent = self.node(removed).parent.expect("cannot remove the root");
        let children = self.node(removed).children.clone();
        self.remove_child(parent, removed);
        for child in children {
            self.node_mut(child).parent = Some(parent);
            self.insert_child_sorted(parent, child);
        }
        let itemset = self.itemset_of(removed);
        self.index.remove(&itemset);
        self.arena[removed.0] = None;
    }
}

impl<T: ItemType> SlidingWindowAlgorithm<T> for DiuEngine<T> {
    fn add(&mut self, x: Itemset<T>) -> Result<()> {
        if x.is_empty() {
            return Err(MiningError::InvariantViolation(
                "add() requires a non-empty itemset".to_string(),
            ));
        }
        self.register_history(&x);

        if let Some(&id) = self.index.get(&x) {
            self.node_mut(id).count += 1;
            self.node_mut(id).support += 1;
            for c in self.candidates_in_descending_length(&x) {
                if c == x {
                    continue;
                }
                if let Some(&cid) = self.index.get(&c) {
                    self.node_mut(cid).support += 1;
                }
            }
            return Ok(());
        }

        let sup = self.support_if_not_contained(&x);
        let mut new_nodes = vec![PendingNode {
            itemset: x.clone(),
            support: sup + 1,
            count: 1,
        }];

        if x.len() > 1 {
            for c in self.candidates_in_descending_length(&x) {
                if c == x {
                    continue;
                }
                self.propagate_candidate(c, &x, &mut new_nodes);
            }
        }

        new_nodes.sort_by(|a, b| b.itemset.len().cmp(&a.itemset.len()));
        for pending in new_nodes {
            self.insert_node(pending);
        }
        trace!(?x, "DIU: add complete");
        Ok(())
    }

    fn delete(&mut self, x: &Itemset<T>) -> Result<()> {
        let n_id = self
            .index
            .get(x)
            .copied()
            .ok_or_else(|| MiningError::NotInWindow(format!("{:?}", x)))?;

        if self.node(n_id).count >= 2 {
            self.node_mut(n_id).count -= 1;
            for id in self.all_node_ids() {
                if x.contains(&self.itemset_of(id)) {
                    self.node_mut(id).support -= 1;
                }
            }
            return Ok(());
        }

        self.node_mut(n_id).count -= 1;

        let mut subset_ids: Vec<NodeId> = self
            .all_node_ids()
            .into_iter()
            .filter(|&id| x.contains(&self.itemset_of(id)))
            .collect();
        subset_ids.sort_by(|&a, &b| self.itemset_of(b).len().cmp(&self.itemset_of(a).len()));

        let mut obsolete: HashSet<NodeId> = HashSet::new();
        for &s in &subset_ids {
            let s_count = self.node(s).count;
            if s_count >= 2 {
                self.node_mut(s).support -= 1;
                continue;
            }
            let s_itemset = self.itemset_of(s);
            let supersets: Vec<NodeId> = self
                .all_node_ids()
                .into_iter()
                .filter(|&f| f != s && !obsolete.contains(&f) && self.itemset_of(f).strictly_contains(&s_itemset))
                .collect();
            let keep = if supersets.is_empty() {
                true
            } else {
                let mut m = self.itemset_of(supersets[0]);
                for &f in &supersets[1..] {
                    m = m.intersection(&self.itemset_of(f));
                }
                m == s_itemset || s_count > 0
            };
            if keep {
                self.node_mut(s).support -= 1;
            } else {
                obsolete.insert(s);
            }
        }

        // Safety net: any node whose support has dropped to zero no longer
        // occurs in the window and must not be reported as closed, even if
        // the closure check above decided to "keep" it structurally.
        for id in self.all_node_ids() {
            if self.node(id).support == 0 {
                obsolete.insert(id);
            }
        }

        // Remove deepest-first so a parent being removed doesn't orphan a
        // still-to-be-removed child mid-pass.
        let mut ordered: Vec<NodeId> = obsolete.into_iter().collect();
        ordered.sort_by(|&a, &b| self.itemset_of(b).len().cmp(&self.itemset_of(a).len()));
        for o in ordered {
            if self.arena[o.0].is_some() {
                self.remove_node_reparenting(o);
            }
        }
        trace!(?x, "DIU: delete complete");
        Ok(())
    }

    fn support(&self, x: &Itemset<T>) -> usize {
        match self.index.get(x) {
            Some(&id) => self.node(id).support,
            None => self.support_if_not_contained(x),
        }
    }

    fn closed_itemsets(&self) -> Vec<Itemset<T>> {
        self.all_node_ids()
            .into_iter()
            .map(|id| self.itemset_of(id))
            .collect()
    }

    fn closed_frequent(&self, t: usize) -> Vec<Itemset<T>> {
        self.all_node_ids()
            .into_iter()
            .filter(|&id| self.node(id).support >= t)
            .map(|id| self.itemset_of(id))
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
    fn history_completeness() {
        let mut engine = DiuEngine::<i32>::new();
        engine.add(txn(&[1, 2, 3])).unwrap();
        for item in [1, 2, 3] {
            assert!(engine.history().contains_key(&item));
        }
    }

    #[test]
    fn s4_duplicate_transactions() {
        let mut engine = DiuEngine::<i32>::new();
        engine.add(txn(&[1, 2])).unwrap();
        engine.add(txn(&[1, 2])).unwrap();
        engine.add(txn(&[2, 3])).unwrap();
        engine.add(txn(&[3])).unwrap();
        engine.add(txn(&[1, 2, 3, 4])).unwrap();
        engine.delete(&txn(&[1, 2])).unwrap();

        assert!(engine.closed_itemsets().contains(&txn(&[1, 2])));
        assert!(engine.support(&txn(&[1, 2])) >= 2);
    }

    #[test]
    fn delete_unknown_itemset_errors() {
        let mut engine = DiuEngine::<i32>::new();
        engine.add(txn(&[1])).unwrap();
        let err = engine.delete(&txn(&[9])).unwrap_err();
        assert_eq!(err, MiningError::NotInWindow(format!("{:?}", txn(&[9]))));
    }

    #[test]
    fn window_bound_never_exceeds_additions() {
        let mut engine = DiuEngine::<i32>::new();
        for t in [vec![1, 2], vec![1, 2], vec![1, 2]] {
            engine.add(txn(&t)).unwrap();
        }
        for itemset in engine.closed_itemsets() {
            assert!(engine.support(&itemset) <= 3);
        }
    }
}
