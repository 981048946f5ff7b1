//! # spark-popup
//!
//! Popup overlay primitive for reactive terminal UIs.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! fine-grained reactivity.
//!
//! ## Architecture
//!
//! Nodes are indices into parallel arrays, arranged in a tree under a single
//! document body. A popup renders its content the first time it is shown,
//! may live under a different container than the one it was declared in
//! (teleport), holds a slot in a reference-counted scroll lock while visible,
//! and puts a tap-to-dismiss overlay right behind itself.
//!
//! ```text
//! input → mouse::dispatch → popup state → node moves, events
//!                                       → pipeline::flush() → overlay
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Node kinds, positions, points
//! - [`engine`] - Node registry, tree, selectors, parallel arrays
//! - [`state`] - Mouse dispatch, scroll lock, stacking, gestures, transitions
//! - [`pipeline`] - Post-render job queue
//! - [`primitives`] - Box and Popup components

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod primitives;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{PopupError, Result};

pub use engine::{
    allocate_index, append_child, children, document_body, get_allocated_indices,
    get_current_parent_index, get_id, get_index, insert_before, is_allocated, on_destroy,
    parent_of, pop_parent_context, push_parent_context, query, release_index, reset_registry,
    Selector,
};

pub use pipeline::{flush, next_tick};

pub use primitives::{
    box_primitive, popup, BoxProps, Cleanup, Popup, PopupEvent, PopupProps, PropValue, Teleport,
};

pub use state::{
    DeferredTransition, DistanceClassifier, Gesture, GestureClassifier, InstantTransition,
    LockTargets, Transition, TransitionDirection, TransitionRequest,
};

/// Reset every thread-local subsystem (for testing).
pub fn reset_all() {
    engine::reset_registry();
    state::mouse::reset_mouse_state();
    state::scroll_lock::reset_scroll_lock();
    state::stacking::reset_z_index();
    pipeline::reset_scheduler();
}
