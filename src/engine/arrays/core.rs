//! Core Arrays
//!
//! The per-node arrays:
//! - kind: What kind of node (body, box, popup, overlay, icon)
//! - parentIndex: Parent in the tree
//! - visible: Is the node rendered
//! - zIndex: Stacking value
//! - classes: Class list (for selectors and presentation)
//! - label: Free-form text (icon name for icons)
//!
//! Values are stored directly (not reactive). Tree structure is mutated only
//! through `engine::tree`, which keeps `parentIndex` and child lists in sync.

use std::cell::RefCell;

use crate::types::NodeKind;

// =============================================================================
// Arrays
// =============================================================================

thread_local! {
    static KIND: RefCell<Vec<NodeKind>> = RefCell::new(Vec::new());

    /// Parent node index (None for roots and detached nodes).
    static PARENT_INDEX: RefCell<Vec<Option<usize>>> = RefCell::new(Vec::new());

    /// Is node visible (false = hidden, still in the tree).
    static VISIBLE: RefCell<Vec<bool>> = RefCell::new(Vec::new());

    static Z_INDEX: RefCell<Vec<i32>> = RefCell::new(Vec::new());

    static CLASSES: RefCell<Vec<Vec<String>>> = RefCell::new(Vec::new());

    static LABEL: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

fn grow<T: Clone>(arr: &mut Vec<T>, index: usize, default: T) {
    if arr.len() <= index {
        arr.resize(index + 1, default);
    }
}

// =============================================================================
// Capacity Management
// =============================================================================

/// Ensure arrays have capacity for the given index.
pub fn ensure_capacity(index: usize) {
    KIND.with(|arr| grow(&mut arr.borrow_mut(), index, NodeKind::None));
    PARENT_INDEX.with(|arr| grow(&mut arr.borrow_mut(), index, None));
    VISIBLE.with(|arr| grow(&mut arr.borrow_mut(), index, true));
    Z_INDEX.with(|arr| grow(&mut arr.borrow_mut(), index, 0));
    CLASSES.with(|arr| grow(&mut arr.borrow_mut(), index, Vec::new()));
    LABEL.with(|arr| grow(&mut arr.borrow_mut(), index, String::new()));
}

/// Clear values at index (called when releasing).
pub fn clear_at_index(index: usize) {
    KIND.with(|arr| {
        if let Some(v) = arr.borrow_mut().get_mut(index) {
            *v = NodeKind::None;
        }
    });
    PARENT_INDEX.with(|arr| {
        if let Some(v) = arr.borrow_mut().get_mut(index) {
            *v = None;
        }
    });
    VISIBLE.with(|arr| {
        if let Some(v) = arr.borrow_mut().get_mut(index) {
            *v = true;
        }
    });
    Z_INDEX.with(|arr| {
        if let Some(v) = arr.borrow_mut().get_mut(index) {
            *v = 0;
        }
    });
    CLASSES.with(|arr| {
        if let Some(v) = arr.borrow_mut().get_mut(index) {
            v.clear();
        }
    });
    LABEL.with(|arr| {
        if let Some(v) = arr.borrow_mut().get_mut(index) {
            v.clear();
        }
    });
}

/// Reset all arrays.
pub fn reset() {
    KIND.with(|arr| arr.borrow_mut().clear());
    PARENT_INDEX.with(|arr| arr.borrow_mut().clear());
    VISIBLE.with(|arr| arr.borrow_mut().clear());
    Z_INDEX.with(|arr| arr.borrow_mut().clear());
    CLASSES.with(|arr| arr.borrow_mut().clear());
    LABEL.with(|arr| arr.borrow_mut().clear());
}

// =============================================================================
// Kind
// =============================================================================

pub fn get_kind(index: usize) -> NodeKind {
    KIND.with(|arr| arr.borrow().get(index).copied().unwrap_or_default())
}

pub fn set_kind(index: usize, kind: NodeKind) {
    KIND.with(|arr| {
        let mut arr = arr.borrow_mut();
        grow(&mut arr, index, NodeKind::None);
        arr[index] = kind;
    });
}

// =============================================================================
// Parent Index
// =============================================================================

/// Get parent index at index.
pub fn get_parent_index(index: usize) -> Option<usize> {
    PARENT_INDEX.with(|arr| arr.borrow().get(index).copied().flatten())
}

/// Set parent index at index.
///
/// Only `engine::tree` should call this; it also maintains the child lists.
pub(crate) fn set_parent_index(index: usize, parent: Option<usize>) {
    PARENT_INDEX.with(|arr| {
        let mut arr = arr.borrow_mut();
        grow(&mut arr, index, None);
        arr[index] = parent;
    });
}

// =============================================================================
// Visible
// =============================================================================

/// Get visibility at index. Unknown indices read as visible.
pub fn get_visible(index: usize) -> bool {
    VISIBLE.with(|arr| arr.borrow().get(index).copied().unwrap_or(true))
}

pub fn set_visible(index: usize, visible: bool) {
    VISIBLE.with(|arr| {
        let mut arr = arr.borrow_mut();
        grow(&mut arr, index, true);
        arr[index] = visible;
    });
}

// =============================================================================
// Z-Index
// =============================================================================

pub fn get_z_index(index: usize) -> i32 {
    Z_INDEX.with(|arr| arr.borrow().get(index).copied().unwrap_or(0))
}

pub fn set_z_index(index: usize, z_index: i32) {
    Z_INDEX.with(|arr| {
        let mut arr = arr.borrow_mut();
        grow(&mut arr, index, 0);
        arr[index] = z_index;
    });
}

// =============================================================================
// Classes
// =============================================================================

pub fn get_classes(index: usize) -> Vec<String> {
    CLASSES.with(|arr| arr.borrow().get(index).cloned().unwrap_or_default())
}

pub fn has_class(index: usize, class: &str) -> bool {
    CLASSES.with(|arr| {
        arr.borrow()
            .get(index)
            .is_some_and(|classes| classes.iter().any(|c| c == class))
    })
}

/// Add a class. Adding a class twice keeps one copy.
pub fn add_class(index: usize, class: &str) {
    CLASSES.with(|arr| {
        let mut arr = arr.borrow_mut();
        grow(&mut arr, index, Vec::new());
        if !arr[index].iter().any(|c| c == class) {
            arr[index].push(class.to_string());
        }
    });
}

pub fn remove_class(index: usize, class: &str) {
    CLASSES.with(|arr| {
        if let Some(classes) = arr.borrow_mut().get_mut(index) {
            classes.retain(|c| c != class);
        }
    });
}

/// Add or remove a class depending on `on`.
pub fn toggle_class(index: usize, class: &str, on: bool) {
    if on {
        add_class(index, class);
    } else {
        remove_class(index, class);
    }
}

// =============================================================================
// Label
// =============================================================================

pub fn get_label(index: usize) -> String {
    LABEL.with(|arr| arr.borrow().get(index).cloned().unwrap_or_default())
}

pub fn set_label(index: usize, label: &str) {
    LABEL.with(|arr| {
        let mut arr = arr.borrow_mut();
        grow(&mut arr, index, String::new());
        arr[index] = label.to_string();
    });
}
