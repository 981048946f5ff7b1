//! State Module - Runtime state shared across popups
//!
//! - **Mouse** - HitGrid, event dispatch, per-node and global handlers
//! - **Input** - crossterm bridge into mouse dispatch
//! - **Scroll lock** - Reference-counted document lock, gesture blocking
//! - **Stacking** - Global z-index counter
//! - **Gesture** - Tap vs drag classification
//! - **Transition** - Enter/leave timing collaborators

pub mod gesture;
pub mod input;
pub mod mouse;
pub mod scroll_lock;
pub mod stacking;
pub mod transition;

pub use gesture::{DistanceClassifier, Gesture, GestureClassifier, DEFAULT_DRAG_THRESHOLD};
pub use scroll_lock::LockTargets;
pub use transition::{
    DeferredTransition, InstantTransition, Transition, TransitionDirection, TransitionRequest,
};
