//! Error type for fallible node and configuration operations.
//!
//! Nothing on the popup lifecycle path returns these to the caller. They are
//! produced by the lower-level APIs (selector parsing, tree moves, teleport
//! resolution) and the popup recovers from them locally.

use thiserror::Error;

/// Errors produced by the node tree, selectors and popup configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PopupError {
    /// Selector string could not be parsed.
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),

    /// Position string is not one of center/top/bottom/left/right.
    #[error("unknown popup position `{0}`")]
    UnknownPosition(String),

    /// Node index does not refer to a live node.
    #[error("node {0} is not allocated")]
    NodeNotAllocated(usize),

    /// Moving `child` under `parent` would make a node its own ancestor.
    #[error("cannot move node {child} into its own subtree (target {parent})")]
    HierarchyCycle { child: usize, parent: usize },
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, PopupError>;
