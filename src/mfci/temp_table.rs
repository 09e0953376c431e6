//! `TempTable`: per-`add` scratch set of candidate closed itemsets
//! (spec §3.3, §4.3.1).

use super::content_table::Cid;
use crate::{Itemset, ItemType};

#[derive(Debug, Clone)]
pub struct TempEntry<T: ItemType> {
    /// The content-table entry this candidate grew out of. `None` only for
    /// the entry prepended for the transaction `X` itself when it wasn't
    /// already produced by intersection (spec's `closureId=-1` sentinel).
    pub closure_id: Option<Cid>,
    pub itemset: Itemset<T>,
    pub status: u8,
    pub support: usize,
    /// The content-table entry this candidate resolves to, once `add`'s
    /// main loop has allocated or reused one.
    pub cid: Option<Cid>,
}
