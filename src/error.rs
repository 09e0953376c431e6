//! Error surface for the core mining engines.
//!
//! The core never performs I/O and has exactly two fallible situations (see
//! spec §7): deleting an itemset that is not currently in the window, and a
//! detected violation of a structural invariant. An empty query (negative
//! threshold, empty window) is not an error: it simply returns an empty set.

use thiserror::Error;

/// Errors surfaced by a [`crate::engine::SlidingWindowAlgorithm`] implementation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MiningError {
    /// `delete(x)` was called for an itemset `x` that the engine has no record
    /// of currently holding in the window (or that has already been deleted a
    /// matching number of times).
    #[error("itemset {0} was not present in the current window")]
    NotInWindow(String),

    /// A structural invariant that should be impossible to violate was
    /// detected at runtime. This indicates an algorithm bug, not a caller
    /// error; the core does not attempt to self-heal.
    #[error("closure invariant violated: {0}")]
    InvariantViolation(String),
}

/// Convenience alias used throughout the engines.
pub type Result<T> = std::result::Result<T, MiningError>;
