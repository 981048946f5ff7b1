//! Node Tree - Imperative structure operations.
//!
//! The registry hands out indices; this module arranges them into a tree:
//! ordered child lists, the single document body, moves, and queries.
//!
//! Every structural change goes through here so that `parentIndex` in the
//! core arrays and the child lists never disagree.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::arrays::core;
use super::registry::{allocate_index, is_allocated};
use super::selector::Selector;
use crate::error::{PopupError, Result};
use crate::types::NodeKind;

/// ID under which the document body is registered.
pub const BODY_ID: &str = "body";

thread_local! {
    static CHILDREN: RefCell<HashMap<usize, Vec<usize>>> = RefCell::new(HashMap::new());

    static BODY: Cell<Option<usize>> = const { Cell::new(None) };
}

// =============================================================================
// Document Body
// =============================================================================

/// Get the document body, creating it on first use.
pub fn document_body() -> usize {
    if let Some(body) = BODY.with(|b| b.get()) {
        if is_allocated(body) {
            return body;
        }
    }
    let body = allocate_index(Some(BODY_ID));
    core::set_kind(body, NodeKind::Body);
    BODY.with(|b| b.set(Some(body)));
    body
}

/// Is the node attached (directly or through ancestors) to the body?
pub fn is_connected(index: usize) -> bool {
    let Some(body) = BODY.with(|b| b.get()) else {
        return false;
    };
    index == body || contains(body, index)
}

// =============================================================================
// Queries
// =============================================================================

pub fn parent_of(index: usize) -> Option<usize> {
    core::get_parent_index(index)
}

/// Children of a node, in order.
pub fn children(index: usize) -> Vec<usize> {
    CHILDREN.with(|c| c.borrow().get(&index).cloned().unwrap_or_default())
}

/// Does `ancestor` contain `node` (strictly below it)?
pub fn contains(ancestor: usize, node: usize) -> bool {
    let mut current = parent_of(node);
    while let Some(idx) = current {
        if idx == ancestor {
            return true;
        }
        current = parent_of(idx);
    }
    false
}

/// Walk up from `index` (inclusive) and return the first node matching `pred`.
pub fn closest(index: usize, pred: impl Fn(usize) -> bool) -> Option<usize> {
    let mut current = Some(index);
    while let Some(idx) = current {
        if pred(idx) {
            return Some(idx);
        }
        current = parent_of(idx);
    }
    None
}

/// First node in document order matching the selector.
///
/// Only nodes connected to the document body are searched.
pub fn query_selector(selector: &Selector) -> Option<usize> {
    let body = BODY.with(|b| b.get())?;
    if !is_allocated(body) {
        return None;
    }
    let mut stack = vec![body];
    while let Some(idx) = stack.pop() {
        if selector.matches(idx) {
            return Some(idx);
        }
        // Reverse so the first child is visited first
        stack.extend(children(idx).into_iter().rev());
    }
    None
}

/// Parse and run a selector in one step.
pub fn query(selector: &str) -> Result<Option<usize>> {
    Ok(query_selector(&Selector::parse(selector)?))
}

// =============================================================================
// Mutations
// =============================================================================

fn check_move(parent: usize, child: usize) -> Result<()> {
    if !is_allocated(parent) {
        return Err(PopupError::NodeNotAllocated(parent));
    }
    if !is_allocated(child) {
        return Err(PopupError::NodeNotAllocated(child));
    }
    if parent == child || contains(child, parent) {
        return Err(PopupError::HierarchyCycle { child, parent });
    }
    Ok(())
}

/// Move `child` to the end of `parent`'s children.
pub fn append_child(parent: usize, child: usize) -> Result<()> {
    insert_before(parent, child, None)
}

/// Move `child` under `parent`, directly before `reference`.
///
/// A `reference` that is not a child of `parent` appends instead.
pub fn insert_before(parent: usize, child: usize, reference: Option<usize>) -> Result<()> {
    check_move(parent, child)?;
    detach(child);

    CHILDREN.with(|c| {
        let mut c = c.borrow_mut();
        let list = c.entry(parent).or_default();
        let position = reference.and_then(|r| list.iter().position(|&i| i == r));
        match position {
            Some(pos) => list.insert(pos, child),
            None => list.push(child),
        }
    });
    core::set_parent_index(child, Some(parent));
    Ok(())
}

/// Remove a node from its parent. The node and its subtree stay allocated.
pub fn detach(child: usize) {
    if let Some(parent) = parent_of(child) {
        CHILDREN.with(|c| {
            let mut c = c.borrow_mut();
            if let Some(list) = c.get_mut(&parent) {
                list.retain(|&i| i != child);
                if list.is_empty() {
                    c.remove(&parent);
                }
            }
        });
    }
    core::set_parent_index(child, None);
}

/// Drop all tree bookkeeping for a node being released.
pub(crate) fn forget(index: usize) {
    detach(index);
    CHILDREN.with(|c| {
        c.borrow_mut().remove(&index);
    });
    BODY.with(|b| {
        if b.get() == Some(index) {
            b.set(None);
        }
    });
}

/// Reset all tree state (for testing).
pub fn reset_tree() {
    CHILDREN.with(|c| c.borrow_mut().clear());
    BODY.with(|b| b.set(None));
}
