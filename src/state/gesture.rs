//! Gesture classification for pointer sequences.
//!
//! A press followed by a release is either a tap or the end of a drag. The
//! overlay only closes its popup on taps, so a user scrolling or swiping
//! across the dimmed background does not dismiss it.

use crate::types::Point;

/// Movement (in cells) above which a press/release pair counts as a drag.
pub const DEFAULT_DRAG_THRESHOLD: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Tap,
    Drag,
}

/// Decides whether a pointer sequence was a tap or a drag.
pub trait GestureClassifier {
    fn classify(&self, start: Point, end: Point) -> Gesture;
}

/// Classifies by straight-line distance between press and release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceClassifier {
    pub threshold: f32,
}

impl DistanceClassifier {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

impl Default for DistanceClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_DRAG_THRESHOLD)
    }
}

impl GestureClassifier for DistanceClassifier {
    fn classify(&self, start: Point, end: Point) -> Gesture {
        if start.distance_to(end) > self.threshold {
            Gesture::Drag
        } else {
            Gesture::Tap
        }
    }
}
