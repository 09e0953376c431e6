//! `ItemTable`: `item -> [cid]` index (spec §3.3).

use std::collections::HashMap;

use super::content_table::Cid;
use crate::{Itemset, ItemType};

#[derive(Default)]
pub struct ItemTable<T: ItemType> {
    map: HashMap<T, Vec<Cid>>,
}

impl<T: ItemType> ItemTable<T> {
    pub fn new() -> Self {
        ItemTable {
            map: HashMap::new(),
        }
    }

    pub fn cids_for(&self, item: &T) -> &[Cid] {
        self.map.get(item).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Register `cid` under every item of `itemset`. Duplicates disallowed.
    pub fn register(&mut self, itemset: &Itemset<T>, cid: Cid) {
        for &item in itemset.iter() {
            let cids = self.map.entry(item).or_default();
            if !cids.contains(&cid) {
                cids.push(cid);
            }
        }
    }

    /// Remove `cid` from every item of `itemset`, dropping the item's entry
    /// entirely once its cid list is empty.
    pub fn unregister(&mut self, itemset: &Itemset<T>, cid: Cid) {
        for &item in itemset.iter() {
            if let Some(cids) = self.map.get_mut(&item) {
                cids.retain(|&c| c != cid);
                if cids.is_empty() {
                    self.map.remove(&item);
                }
            }
        }
    }
}
