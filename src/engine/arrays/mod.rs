//! Parallel Arrays
//!
//! All node state lives in these parallel arrays.
//! Each array index corresponds to one node.
//!
//! # Array Categories
//!
//! - **core**: Kind, parent, visibility, z-index, classes, label

pub mod core;

/// Ensure all arrays have capacity for the given index.
///
/// Called by registry when allocating.
pub fn ensure_all_capacity(index: usize) {
    core::ensure_capacity(index);
}

/// Clear all array values at an index.
///
/// Called by registry when releasing.
pub fn clear_all_at_index(index: usize) {
    core::clear_at_index(index);
}

/// Reset all parallel arrays to release memory.
pub fn reset_all_arrays() {
    core::reset();
}
