//! Transitions - enter/leave timing for popups.
//!
//! The popup never animates anything itself. It hands a `TransitionRequest`
//! to a `Transition` and gets a completion callback back, which is where the
//! `opened`/`closed` events come from.

use std::time::Duration;

use crate::pipeline::next_tick;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDirection {
    Enter,
    Leave,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRequest {
    /// `spark-fade` or `spark-popup-slide-{position}`.
    pub name: String,
    pub direction: TransitionDirection,
    /// `None` means the transition's own default.
    pub duration: Option<Duration>,
}

impl TransitionRequest {
    /// Build a request, converting a duration in seconds.
    ///
    /// Negative, NaN or overflowing values are treated as unset.
    pub fn new(name: impl Into<String>, direction: TransitionDirection, seconds: Option<f32>) -> Self {
        Self {
            name: name.into(),
            direction,
            duration: seconds.and_then(|s| Duration::try_from_secs_f32(s).ok()),
        }
    }
}

pub trait Transition {
    /// Start the transition. `done` must be called exactly once.
    fn run(&self, request: TransitionRequest, done: Box<dyn FnOnce()>);
}

/// Completes immediately, inside `run`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantTransition;

impl Transition for InstantTransition {
    fn run(&self, _request: TransitionRequest, done: Box<dyn FnOnce()>) {
        done();
    }
}

/// Completes on the next scheduler flush.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeferredTransition;

impl Transition for DeferredTransition {
    fn run(&self, _request: TransitionRequest, done: Box<dyn FnOnce()>) {
        next_tick(done);
    }
}
