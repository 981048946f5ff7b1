//! Teleport - resolving where a popup's root node lives.
//!
//! A popup is created inside some parent context (its natural parent) but may
//! ask to be mounted somewhere else: a node it already knows, a node looked
//! up by id, the first match of a selector, or whatever a factory returns at
//! the time of asking.
//!
//! Resolution never fails from the popup's point of view. Anything that
//! cannot be used falls back to the natural parent.

use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::engine::{contains, get_index, is_allocated, query_selector, Selector};
use crate::error::{PopupError, Result};

/// Where to mount a popup.
#[derive(Clone, Default)]
pub enum Teleport {
    /// Stay under the natural parent.
    #[default]
    None,
    /// A specific node.
    ///
    /// Indices are recycled after release, so a stale index may point at an
    /// unrelated node allocated later. Prefer `Id` for long-lived targets.
    Node(usize),
    /// The node registered under this id, looked up on every resolution.
    Id(String),
    /// First node in document order matching the selector.
    Selector(String),
    /// Evaluated fresh on every resolution.
    Factory(Rc<dyn Fn() -> Option<usize>>),
}

impl Teleport {
    pub fn factory(f: impl Fn() -> Option<usize> + 'static) -> Self {
        Teleport::Factory(Rc::new(f))
    }
}

impl fmt::Debug for Teleport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Teleport::None => f.write_str("None"),
            Teleport::Node(idx) => f.debug_tuple("Node").field(idx).finish(),
            Teleport::Id(id) => f.debug_tuple("Id").field(id).finish(),
            Teleport::Selector(s) => f.debug_tuple("Selector").field(s).finish(),
            Teleport::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

impl From<usize> for Teleport {
    fn from(index: usize) -> Self {
        Teleport::Node(index)
    }
}

impl From<&str> for Teleport {
    fn from(selector: &str) -> Self {
        Teleport::Selector(selector.to_string())
    }
}

/// Resolve a teleport target.
///
/// `Ok(None)` means "no target, use the natural parent" (absent teleport,
/// unknown id, selector without a match, factory returning `None`). Errors report targets
/// that exist in the configuration but cannot be used: a malformed selector,
/// a released node, or a node inside `root` itself.
pub fn try_resolve(teleport: &Teleport, root: Option<usize>) -> Result<Option<usize>> {
    let target = match teleport {
        Teleport::None => return Ok(None),
        Teleport::Node(idx) => Some(*idx),
        Teleport::Id(id) => get_index(id),
        Teleport::Selector(s) => query_selector(&Selector::parse(s)?),
        Teleport::Factory(f) => f(),
    };

    let Some(target) = target else {
        return Ok(None);
    };
    if !is_allocated(target) {
        return Err(PopupError::NodeNotAllocated(target));
    }
    if let Some(root) = root {
        if target == root || contains(root, target) {
            return Err(PopupError::HierarchyCycle { child: root, parent: target });
        }
    }
    Ok(Some(target))
}

/// Pick the container for a popup root.
///
/// Returns the teleport target when usable, otherwise `natural_parent`.
pub fn resolve_container(
    natural_parent: Option<usize>,
    teleport: &Teleport,
    root: Option<usize>,
) -> Option<usize> {
    match try_resolve(teleport, root) {
        Ok(Some(target)) => Some(target),
        Ok(None) => natural_parent,
        Err(err) => {
            debug!(?teleport, %err, ?natural_parent, "teleport target unusable, using natural parent");
            natural_parent
        }
    }
}
