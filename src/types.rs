//! Core types for spark-popup.
//!
//! These are the small value types shared by the node engine, the input
//! state modules and the popup primitive.

use std::fmt;
use std::str::FromStr;

use crate::error::PopupError;

// =============================================================================
// Node Kinds - For parallel arrays
// =============================================================================

/// Node kinds for the parallel arrays pattern.
///
/// Each node at index i has kind[i] set to one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum NodeKind {
    #[default]
    None = 0,
    /// The document body. There is exactly one per thread.
    Body = 1,
    /// Plain container.
    Box = 2,
    /// Popup root node.
    Popup = 3,
    /// Dimming layer rendered behind a popup.
    Overlay = 4,
    /// Icon affordance (the popup close icon).
    Icon = 5,
}

impl NodeKind {
    /// Tag name used by tag selectors (`body`, `box`, `popup`, ...).
    pub fn tag_name(self) -> &'static str {
        match self {
            NodeKind::None => "",
            NodeKind::Body => "body",
            NodeKind::Box => "box",
            NodeKind::Popup => "popup",
            NodeKind::Overlay => "overlay",
            NodeKind::Icon => "icon",
        }
    }
}

// =============================================================================
// Popup Position
// =============================================================================

/// Where a popup is anchored on screen.
///
/// Presentation only: the position selects a modifier class and the
/// transition name, it never changes lifecycle behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Position {
    #[default]
    Center,
    Top,
    Bottom,
    Left,
    Right,
}

impl Position {
    /// All positions, in declaration order.
    pub const ALL: [Position; 5] = [
        Position::Center,
        Position::Top,
        Position::Bottom,
        Position::Left,
        Position::Right,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Position::Center => "center",
            Position::Top => "top",
            Position::Bottom => "bottom",
            Position::Left => "left",
            Position::Right => "right",
        }
    }

    /// Name handed to the transition collaborator.
    ///
    /// Centered popups fade, edge-anchored popups slide in from their edge.
    pub fn transition_name(self) -> String {
        match self {
            Position::Center => "spark-fade".to_string(),
            edge => format!("spark-popup-slide-{}", edge.as_str()),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = PopupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| PopupError::UnknownPosition(s.to_string()))
    }
}

// =============================================================================
// Point
// =============================================================================

/// A terminal cell coordinate (0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Point {
    pub x: u16,
    pub y: u16,
}

impl Point {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in cells.
    pub fn distance_to(self, other: Point) -> f32 {
        let dx = other.x as f32 - self.x as f32;
        let dy = other.y as f32 - self.y as f32;
        dx.hypot(dy)
    }
}
