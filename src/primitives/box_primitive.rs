//! Box Primitive - Plain container node.
//!
//! Boxes build the page around popups: layout sections, teleport targets,
//! popup content. A box created outside any parent context is appended to the
//! document body.
//!
//! # Example
//!
//! ```ignore
//! use spark_popup::primitives::{box_primitive, BoxProps};
//!
//! let cleanup = box_primitive(BoxProps {
//!     id: Some("page".into()),
//!     children: Some(Box::new(|| {
//!         box_primitive(BoxProps {
//!             class: Some("teleport-target".into()),
//!             ..Default::default()
//!         });
//!     })),
//!     ..Default::default()
//! });
//! ```

use spark_signals::{effect, effect_scope};
use tracing::debug;

use super::types::{BoxProps, Cleanup, PropValue};
use crate::engine::arrays::core;
use crate::engine::{
    allocate_index, append_child, document_body, get_current_parent_index, is_allocated,
    on_destroy, pop_parent_context, push_parent_context, release_index,
};
use crate::state::mouse;
use crate::types::NodeKind;

/// Add every class of a space-separated list.
pub(crate) fn add_class_list(index: usize, classes: &str) {
    for class in classes.split_whitespace() {
        core::add_class(index, class);
    }
}

/// Create a box container component.
///
/// Returns a cleanup function that releases the box and its subtree.
pub fn box_primitive(props: BoxProps) -> Cleanup {
    // 1. ALLOCATE INDEX
    let index = allocate_index(props.id.as_deref());

    // 2. CORE SETUP - Kind, parent, classes
    core::set_kind(index, NodeKind::Box);
    let parent = get_current_parent_index().unwrap_or_else(document_body);
    if let Err(err) = append_child(parent, index) {
        debug!(index, parent, %err, "box left detached");
    }
    if let Some(class) = &props.class {
        add_class_list(index, class);
    }

    // 3. BIND VISIBILITY
    let mut scope_cleanup: Option<Cleanup> = None;
    match props.visible {
        Some(PropValue::Static(v)) => core::set_visible(index, v),
        Some(reactive) => {
            let scope = effect_scope(false);
            scope.run(move || {
                let _effect_cleanup = effect(move || {
                    let visible = reactive.get();
                    if is_allocated(index) {
                        core::set_visible(index, visible);
                    }
                });
            });
            scope_cleanup = Some(Box::new(move || scope.stop()));
        }
        None => {}
    }

    // 4. REGISTER MOUSE HANDLERS
    let remove_handlers = props.on_click.map(|on_click| {
        mouse::on_component(index, mouse::MouseHandlers {
            on_click: Some(on_click),
            ..Default::default()
        })
    });
    on_destroy(index, move || {
        if let Some(remove) = remove_handlers {
            remove();
        }
        mouse::cleanup_index(index);
        if let Some(stop) = scope_cleanup {
            stop();
        }
    });

    // 5. RENDER CHILDREN
    if let Some(children) = props.children {
        push_parent_context(index);
        children();
        pop_parent_context();
    }

    // 6. RETURN CLEANUP
    Box::new(move || {
        release_index(index);
    })
}

// =============================================================================
// Tests
// =============================================================================
