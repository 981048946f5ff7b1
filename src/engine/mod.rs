//! Engine - Node registry, tree and parallel arrays.
//!
//! The engine manages the core data structures:
//! - Registry: Index allocation, ID mapping, parent context, destroy callbacks
//! - Tree: Ordered children, document body, moves and selector queries
//! - Arrays: Parallel arrays for per-node state
//!
//! # Architecture
//!
//! Nodes are NOT objects. They are indices into parallel arrays:
//!
//! ```text
//! Index 0: Body    (parent=None, visible=true)
//! Index 1: Box     (parent=0,    visible=true)
//! Index 2: Overlay (parent=1,    visible=true,  z=2001)
//! Index 3: Popup   (parent=1,    visible=true,  z=2002)
//! ```

mod registry;
pub mod arrays;
pub mod selector;
pub mod tree;

pub use registry::*;
pub use selector::Selector;
pub use tree::{
    append_child, children, closest, contains, detach, document_body, insert_before,
    is_connected, parent_of, query, query_selector, BODY_ID,
};
