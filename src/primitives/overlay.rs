//! Overlay - the dimming layer behind a popup.
//!
//! One controller per popup, owning at most one overlay node. The node is
//! created on first show, hidden (not removed) on hide, and released only
//! when the controller is destroyed or its container goes away.
//!
//! The node always sits directly before its popup's root in the same parent,
//! one z-index below it.
//!
//! Pointer handling: mouse-down on the overlay records where the press
//! started, the click supplies where it ended, and the gesture classifier
//! decides. Only taps reach `on_activate`.

use std::cell::Cell;
use std::rc::Rc;

use tracing::trace;

use crate::engine::arrays::core;
use crate::engine::{allocate_index, insert_before, is_allocated, on_destroy, parent_of, release_index};
use crate::state::gesture::{Gesture, GestureClassifier};
use crate::state::mouse::{self, MouseEvent, MouseHandlers};
use crate::types::{NodeKind, Point};

pub const OVERLAY_CLASS: &str = "spark-overlay";

struct PointerState {
    /// Cleared by a destroy callback if the node is released from outside.
    node: Cell<Option<usize>>,
    press_start: Cell<Option<Point>>,
    gesture: Rc<dyn GestureClassifier>,
    on_activate: Rc<dyn Fn()>,
}

impl PointerState {
    fn handle(&self, start: Point, end: Point) -> Gesture {
        let gesture = self.gesture.classify(start, end);
        trace!(?start, ?end, ?gesture, "overlay pointer sequence");
        if gesture == Gesture::Tap {
            (self.on_activate)();
        }
        gesture
    }
}

pub struct OverlayController {
    state: Rc<PointerState>,
    visible: Cell<bool>,
}

impl OverlayController {
    /// `on_activate` runs for every tap on the overlay.
    pub fn new(gesture: Rc<dyn GestureClassifier>, on_activate: Rc<dyn Fn()>) -> Self {
        Self {
            state: Rc::new(PointerState {
                node: Cell::new(None),
                press_start: Cell::new(None),
                gesture,
                on_activate,
            }),
            visible: Cell::new(false),
        }
    }

    /// Overlay node, once created.
    pub fn node(&self) -> Option<usize> {
        self.state.node.get()
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get() && self.node().is_some()
    }

    fn ensure_node(&self) -> usize {
        if let Some(node) = self.node() {
            return node;
        }

        let node = allocate_index(None);
        core::set_kind(node, NodeKind::Overlay);
        core::add_class(node, OVERLAY_CLASS);

        let down_state = self.state.clone();
        let click_state = self.state.clone();
        let remove_handlers = mouse::on_component(node, MouseHandlers {
            on_mouse_down: Some(Rc::new(move |event: &MouseEvent| {
                down_state.press_start.set(Some(event.point()));
            })),
            on_click: Some(Rc::new(move |event: &MouseEvent| {
                let end = event.point();
                let start = click_state.press_start.take().unwrap_or(end);
                click_state.handle(start, end);
            })),
            ..Default::default()
        });

        let weak = Rc::downgrade(&self.state);
        on_destroy(node, move || {
            remove_handlers();
            mouse::cleanup_index(node);
            if let Some(state) = weak.upgrade() {
                state.node.set(None);
                state.press_start.set(None);
            }
        });

        self.state.node.set(Some(node));
        trace!(node, "overlay node created");
        node
    }

    /// Show the overlay behind `anchor` (the popup root).
    pub fn show(&self, anchor: usize, popup_z: i32) {
        let node = self.ensure_node();
        self.reposition(anchor);
        core::set_z_index(node, popup_z.saturating_sub(1));
        core::set_visible(node, true);
        self.visible.set(true);
    }

    /// Hide the overlay. The node stays in the tree.
    pub fn hide(&self) {
        self.visible.set(false);
        self.state.press_start.set(None);
        if let Some(node) = self.node() {
            core::set_visible(node, false);
        }
    }

    /// Move the overlay node directly before `anchor`.
    ///
    /// No-op until the node exists. An anchor without a parent leaves the
    /// overlay where it is.
    pub fn reposition(&self, anchor: usize) {
        let Some(node) = self.node() else { return };
        let Some(parent) = parent_of(anchor) else {
            trace!(node, anchor, "anchor detached, overlay not moved");
            return;
        };
        if let Err(err) = insert_before(parent, node, Some(anchor)) {
            trace!(node, anchor, %err, "overlay move rejected");
        }
    }

    /// Keep the overlay one below a popup whose z-index changed.
    pub fn restack(&self, popup_z: i32) {
        if let Some(node) = self.node() {
            core::set_z_index(node, popup_z.saturating_sub(1));
        }
    }

    /// Classify a press/release pair; a tap activates.
    pub fn handle_pointer_sequence(&self, start: Point, end: Point) -> Gesture {
        self.state.handle(start, end)
    }

    /// Release the overlay node and its handlers.
    pub fn destroy(&self) {
        self.visible.set(false);
        if let Some(node) = self.state.node.take() {
            if is_allocated(node) {
                release_index(node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{append_child, children, reset_registry};
    use crate::state::gesture::DistanceClassifier;
    use crate::state::mouse::{dispatch, fill_hit_rect, reset_mouse_state, MouseButton};
    use crate::state::scroll_lock::reset_scroll_lock;

    fn setup() -> (usize, usize) {
        reset_registry();
        reset_mouse_state();
        reset_scroll_lock();
        let parent = allocate_index(None);
        let anchor = allocate_index(None);
        append_child(parent, anchor).unwrap();
        (parent, anchor)
    }

    fn controller(taps: Rc<Cell<usize>>) -> OverlayController {
        OverlayController::new(
            Rc::new(DistanceClassifier::default()),
            Rc::new(move || taps.set(taps.get() + 1)),
        )
    }

    #[test]
    fn test_lazy_node_before_anchor() {
        let (parent, anchor) = setup();
        let overlay = controller(Rc::new(Cell::new(0)));

        assert_eq!(overlay.node(), None);
        overlay.hide();
        assert_eq!(overlay.node(), None);

        overlay.show(anchor, 2002);
        let node = overlay.node().unwrap();
        assert_eq!(children(parent), vec![node, anchor]);
        assert_eq!(core::get_z_index(node), 2001);
        assert_eq!(core::get_kind(node), NodeKind::Overlay);
        assert!(overlay.is_visible());

        overlay.hide();
        assert!(!overlay.is_visible());
        assert!(!core::get_visible(node));

        // Reused, not recreated
        overlay.show(anchor, 2002);
        assert_eq!(overlay.node(), Some(node));
    }

    #[test]
    fn test_reposition_follows_anchor() {
        let (parent, anchor) = setup();
        let elsewhere = allocate_index(None);
        let overlay = controller(Rc::new(Cell::new(0)));
        overlay.show(anchor, 10);
        let node = overlay.node().unwrap();

        append_child(elsewhere, anchor).unwrap();
        overlay.reposition(anchor);

        assert_eq!(children(elsewhere), vec![node, anchor]);
        assert!(children(parent).is_empty());
    }

    #[test]
    fn test_tap_activates_drag_does_not() {
        let (_, anchor) = setup();
        let taps = Rc::new(Cell::new(0));
        let overlay = controller(taps.clone());
        overlay.show(anchor, 2002);

        assert_eq!(overlay.handle_pointer_sequence(Point::new(5, 5), Point::new(5, 5)), Gesture::Tap);
        assert_eq!(taps.get(), 1);

        assert_eq!(overlay.handle_pointer_sequence(Point::new(5, 5), Point::new(5, 20)), Gesture::Drag);
        assert_eq!(taps.get(), 1);
    }

    #[test]
    fn test_mouse_sequence_on_overlay_node() {
        let (_, anchor) = setup();
        let taps = Rc::new(Cell::new(0));
        let overlay = controller(taps.clone());
        overlay.show(anchor, 2002);
        fill_hit_rect(0, 0, 80, 24, overlay.node().unwrap());

        dispatch(MouseEvent::down(MouseButton::Left, 3, 3));
        dispatch(MouseEvent::up(MouseButton::Left, 4, 3));
        assert_eq!(taps.get(), 1);

        dispatch(MouseEvent::down(MouseButton::Left, 3, 3));
        dispatch(MouseEvent::drag(MouseButton::Left, 3, 10));
        dispatch(MouseEvent::up(MouseButton::Left, 3, 15));
        assert_eq!(taps.get(), 1);

        // Hidden overlay is not hit
        overlay.hide();
        dispatch(MouseEvent::down(MouseButton::Left, 3, 3));
        dispatch(MouseEvent::up(MouseButton::Left, 3, 3));
        assert_eq!(taps.get(), 1);
    }

    #[test]
    fn test_destroy_releases_node() {
        let (parent, anchor) = setup();
        let overlay = controller(Rc::new(Cell::new(0)));
        overlay.show(anchor, 2002);
        let node = overlay.node().unwrap();

        overlay.destroy();

        assert!(!is_allocated(node));
        assert_eq!(overlay.node(), None);
        assert_eq!(children(parent), vec![anchor]);
    }

    #[test]
    fn test_container_release_clears_node() {
        let (parent, anchor) = setup();
        let overlay = controller(Rc::new(Cell::new(0)));
        overlay.show(anchor, 2002);

        release_index(parent);
        assert_eq!(overlay.node(), None);

        // Destroy afterwards does not touch whatever reuses the index
        let reused = allocate_index(None);
        overlay.destroy();
        assert!(is_allocated(reused));
    }
}
