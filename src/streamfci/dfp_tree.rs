//! Arena representation of the dynamic FP-tree (DFP tree) used by StreamFCI
//! (spec §3.4). Node-links are doubly linked (unlike the teacher's
//! single-`neighbor` `Weak` chain) because `delete`/`adjust` must splice a
//! node out of the middle of its item's chain, which needs a predecessor
//! pointer to do in O(1) rather than an O(n) re-walk from the header.

use std::collections::HashMap;

use crate::{Itemset, ItemType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

pub(crate) const ROOT: NodeId = NodeId(0);

#[derive(Debug)]
pub(crate) struct DfpNode<T: ItemType> {
    pub item: Option<T>,
    pub count: usize,
    pub parent: Option<NodeId>,
    pub children: HashMap<T, NodeId>,
    pub node_link_prev: Option<NodeId>,
    pub node_link_next: Option<NodeId>,
}

impl<T: ItemType> DfpNode<T> {
    fn root() -> Self {
        DfpNode {
            item: None,
            count: 0,
            parent: None,
            children: HashMap::new(),
            node_link_prev: None,
            node_link_next: None,
        }
    }

    fn new(item: T, count: usize, parent: NodeId) -> Self {
        DfpNode {
            item: Some(item),
            count,
            parent: Some(parent),
            children: HashMap::new(),
            node_link_prev: None,
            node_link_next: None,
        }
    }
}

/// `item -> (support, head, tail)` of the node-link chain threading every
/// node carrying that item (spec §3.4). `support` is maintained
/// incrementally, not recomputed from the chain.
#[derive(Debug)]
pub(crate) struct HeaderEntry {
    pub support: usize,
    pub head: Option<NodeId>,
    pub tail: Option<NodeId>,
}

/// Arena-backed dynamic FP-tree. Tombstones freed slots with `None` rather
/// than compacting, matching the DIU arena's approach (spec §9).
pub(crate) struct DfpTree<T: ItemType> {
    pub arena: Vec<Option<DfpNode<T>>>,
    pub headers: HashMap<T, HeaderEntry>,
}

impl<T: ItemType> DfpTree<T> {
    pub fn new() -> Self {
        DfpTree {
            arena: vec![Some(DfpNode::root())],
            headers: HashMap::new(),
        }
    }

    pub fn node(&self, id: NodeId) -> &DfpNode<T> {
        self.arena[id.0].as_ref().expect("dangling NodeId")
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut DfpNode<T> {
        self.arena[id.0].as_mut().expect("dangling NodeId")
    }

    pub fn alloc(&mut self, item: T, count: usize, parent: NodeId) -> NodeId {
        self.arena.push(Some(DfpNode::new(item, count, parent)));
        NodeId(self.arena.len() - 1)
    }

    pub fn free(&mut self, id: NodeId) {
        self.arena[id.0] = None;
    }

    pub fn header_support(&self, item: &T) -> usize {
        self.headers.get(item).map(|h| h.support).unwrap_or(0)
    }

    /// Order `x`'s items by header support descending, ties by natural item
    /// order ascending (spec §4.4.1). Items never seen before sort last
    /// among themselves, by natural order, since their support is 0.
    pub fn order_items(&self, x: &Itemset<T>) -> Vec<T> {
        let mut items: Vec<T> = x.iter().copied().collect();
        items.sort_by(|a, b| {
            self.header_support(b)
                .cmp(&self.header_support(a))
                .then_with(|| a.cmp(b))
        });
        items
    }

    /// Append a freshly allocated node to the tail of `item`'s node-link
    /// chain, creating the header entry if this is the first sighting.
    pub fn link_new_node(&mut self, item: T, node_id: NodeId) {
        let tail = self.headers.get(&item).and_then(|h| h.tail);
        if let Some(t) = tail {
            self.node_mut(t).node_link_next = Some(node_id);
            self.node_mut(node_id).node_link_prev = Some(t);
        }
        match self.headers.get_mut(&item) {
            Some(h) => {
                h.tail = Some(node_id);
            }
            None => {
                self.headers.insert(
                    item,
                    HeaderEntry {
                        support: 0,
                        head: Some(node_id),
                        tail: Some(node_id),
                    },
                );
            }
        }
    }

    /// Append an already-existing node (created during `adjust`) to the
    /// tail of `item`'s chain; the header is assumed to already exist.
    pub fn link_existing_node(&mut self, item: T, node_id: NodeId) {
        let tail = self.headers.get(&item).and_then(|h| h.tail);
        if let Some(t) = tail {
            self.node_mut(t).node_link_next = Some(node_id);
            self.node_mut(node_id).node_link_prev = Some(t);
        }
        if let Some(h) = self.headers.get_mut(&item) {
            if h.tail.is_none() {
                h.head = Some(node_id);
            }
            h.tail = Some(node_id);
        }
    }

    /// Splice `node_id` out of its item's node-link chain, without touching
    /// that header's cached `support` (the caller is responsible for the
    /// accounting: splicing happens both when a node's count has already
    /// been folded into a sibling, and when it is being removed outright).
    pub fn unlink_node(&mut self, item: T, node_id: NodeId) {
        let prev = self.node(node_id).node_link_prev;
        let next = self.node(node_id).node_link_next;
        match prev {
            Some(p) => self.node_mut(p).node_link_next = next,
            None => {
                if let Some(h) = self.headers.get_mut(&item) {
                    h.head = next;
                }
            }
        }
        match next {
            Some(n) => self.node_mut(n).node_link_prev = prev,
            None => {
                if let Some(h) = self.headers.get_mut(&item) {
                    h.tail = prev;
                }
            }
        }
        self.node_mut(node_id).node_link_prev = None;
        self.node_mut(node_id).node_link_next = None;
    }

    pub fn chain(&self, item: &T) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.headers.get(item).and_then(|h| h.head);
        while let Some(id) = cur {
            out.push(id);
            cur = self.node(id).node_link_next;
        }
        out
    }
}
