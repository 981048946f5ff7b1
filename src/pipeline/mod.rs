//! Pipeline
//!
//! The render pipeline hook points a popup needs from its host:
//!
//! ```text
//! dispatch turn (state changes) → render → flush() (post-render jobs)
//! ```
//!
//! Node moves and events happen synchronously in the dispatch turn. Work that
//! must observe the rendered tree (overlay insertion, deferred transition
//! completion) is queued with `next_tick` and runs on `flush()`.

pub mod scheduler;

pub use scheduler::{flush, next_tick, pending, reset_scheduler};
