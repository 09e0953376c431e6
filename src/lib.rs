//! A library that incrementally mines **closed frequent itemsets** from a
//! transaction stream under a sliding window.
//!
//! Three independent engines maintain the same logical result set as
//! transactions are added and aged out:
//!
//! - [`diu::DiuEngine`] — a closure tree updated in place per transaction.
//! - [`mfci::MfciEngine`] — a closed-itemset DAG with item/content indices.
//! - [`streamfci::StreamFciEngine`] — a dynamic FP-tree rebalanced by support.
//!
//! All three implement [`engine::SlidingWindowAlgorithm`].
//!
//! ```
//! use fcim::engine::SlidingWindowAlgorithm;
//! use fcim::itemset::Itemset;
//! use fcim::diu::DiuEngine;
//!
//! let mut engine = DiuEngine::<char>::new();
//! engine.add(Itemset::from_iter(['c', 'd'])).unwrap();
//! engine.add(Itemset::from_iter(['a', 'b'])).unwrap();
//! engine.add(Itemset::from_iter(['a', 'b', 'c'])).unwrap();
//! engine.add(Itemset::from_iter(['a', 'b', 'c'])).unwrap();
//! assert_eq!(engine.closed_itemsets().len(), 4);
//! assert_eq!(engine.support(&Itemset::from_iter(['a', 'b'])), 3);
//! ```

use std::fmt::Debug;
use std::hash::Hash;

pub mod diu;
pub mod engine;
pub mod error;
pub mod itemset;
pub mod mfci;
pub mod streamfci;

pub use engine::SlidingWindowAlgorithm;
pub use error::{MiningError, Result};
pub use itemset::Itemset;

/// The domain of items an [`Itemset`] may contain. A totally ordered,
/// hashable, freely copyable, debug-printable type — the same bound the
/// original FP-Growth tree used for its item type parameter.
pub trait ItemType: Eq + Ord + Hash + Copy + Debug {}

impl<T> ItemType for T where T: Eq + Ord + Hash + Copy + Debug {}
