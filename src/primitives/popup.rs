//! Popup Primitive - overlay/modal box with lazy render and teleport.
//!
//! A popup is created hidden and renders nothing until it is first shown.
//! From then on its root node persists: hiding only toggles visibility.
//!
//! # Lifecycle
//!
//! ```text
//! popup(props)            natural parent captured, nothing rendered
//! set_visible(true)       open → render once → teleport → z → enter
//!                         → scroll lock → overlay on next flush
//! set_visible(false)      overlay hidden → lock released → leave → close
//! destroy() / drop        lock released, overlay removed, root released
//! ```
//!
//! # Two-way binding
//!
//! `value` may be a signal. Changes coming from the signal open or close the
//! popup without echoing an update back. Changes coming from inside the popup
//! (overlay tap, close icon) or through `set_visible` emit
//! `PopupEvent::UpdateValue`, which `PopupProps::model` writes into the
//! signal.
//!
//! # Example
//!
//! ```ignore
//! let show = signal(false);
//! let sheet = popup(PopupProps {
//!     position: Position::Bottom,
//!     closeable: true,
//!     children: Some(Box::new(|| { box_primitive(BoxProps::default()); })),
//!     ..PopupProps::model(show.clone())
//! });
//!
//! show.set(true);
//! pipeline::flush(); // overlay appears
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use spark_signals::{effect, effect_scope, untrack, with_context, AnyReaction};
use tracing::{debug, trace};

use super::box_primitive::add_class_list;
use super::overlay::OverlayController;
use super::teleport::{resolve_container, Teleport};
use super::types::{Cleanup, EventCallback, PopupEvent, PopupListener, PopupProps, PropValue, UpdateCallback};
use crate::engine::arrays::core;
use crate::engine::{
    allocate_index, append_child, document_body, get_current_parent_index, is_allocated,
    on_destroy, parent_of, pop_parent_context, push_parent_context, release_index,
};
use crate::pipeline::next_tick;
use crate::state::gesture::{DistanceClassifier, GestureClassifier};
use crate::state::mouse::{self, MouseEvent, MouseHandlers};
use crate::state::scroll_lock;
use crate::state::stacking::next_z_index;
use crate::state::transition::{InstantTransition, Transition, TransitionDirection, TransitionRequest};
use crate::types::{NodeKind, Position};

pub const POPUP_CLASS: &str = "spark-popup";
pub const ROUND_CLASS: &str = "spark-popup--round";
pub const CLOSE_ICON_CLASS: &str = "spark-popup__close-icon";

fn position_class(position: Position) -> String {
    format!("{POPUP_CLASS}--{position}")
}

/// Who asked for a visibility change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// The bound value changed. No update event.
    Binding,
    /// `set_visible`, overlay tap, close icon.
    Api,
    /// Keep-alive deactivation.
    Deactivate,
}

// =============================================================================
// State
// =============================================================================

struct PopupState {
    visible: bool,
    rendered: bool,
    destroyed: bool,
    lock_held: bool,
    should_reopen: bool,

    overlay_enabled: bool,
    lock_scroll: bool,
    teleport: Teleport,
    z_index: Option<i32>,
    assigned_z: Option<i32>,
    duration: Option<f32>,
    position: Position,
    round: bool,
    closeable: bool,
    close_icon: String,
    close_on_click_overlay: bool,

    id: Option<String>,
    class: Option<String>,
    root: Option<usize>,
    close_icon_node: Option<usize>,

    /// Bumped on every open/close; stale transition completions are dropped.
    generation: u64,
}

struct Callbacks {
    on_open: Option<EventCallback>,
    on_close: Option<EventCallback>,
    on_opened: Option<EventCallback>,
    on_closed: Option<EventCallback>,
    on_click: Option<EventCallback>,
    on_click_overlay: Option<EventCallback>,
    on_click_close_icon: Option<EventCallback>,
    on_update_value: Option<UpdateCallback>,
}

impl Callbacks {
    fn call(&self, event: PopupEvent) {
        let callback = match event {
            PopupEvent::Open => &self.on_open,
            PopupEvent::Close => &self.on_close,
            PopupEvent::Opened => &self.on_opened,
            PopupEvent::Closed => &self.on_closed,
            PopupEvent::Click => &self.on_click,
            PopupEvent::ClickOverlay => &self.on_click_overlay,
            PopupEvent::ClickCloseIcon => &self.on_click_close_icon,
            PopupEvent::UpdateValue(value) => {
                if let Some(update) = &self.on_update_value {
                    update(value);
                }
                return;
            }
        };
        if let Some(callback) = callback {
            callback();
        }
    }
}

struct PopupInner {
    weak: Weak<PopupInner>,
    state: RefCell<PopupState>,
    natural_parent: usize,
    callbacks: Callbacks,
    listeners: RefCell<Vec<(usize, PopupListener)>>,
    next_listener: Cell<usize>,
    children: RefCell<Option<Box<dyn FnOnce()>>>,
    transition: Rc<dyn Transition>,
    overlay: OverlayController,
    scope_stop: RefCell<Option<Cleanup>>,
}

/// Handle to a popup instance.
///
/// Cheap to clone. Dropping the last handle destroys the popup.
#[derive(Clone)]
pub struct Popup {
    inner: Rc<PopupInner>,
}

// =============================================================================
// Construction
// =============================================================================

/// Create a popup component.
///
/// Nothing is rendered until the popup is first shown. The natural parent is
/// the current parent context (or the document body at top level).
pub fn popup(props: PopupProps) -> Popup {
    let natural_parent = get_current_parent_index().unwrap_or_else(document_body);

    let PopupProps {
        id,
        class,
        value,
        overlay,
        lock_scroll,
        teleport,
        z_index,
        duration,
        position,
        round,
        closeable,
        close_icon,
        close_on_click_overlay,
        transition,
        gesture,
        children,
        on_open,
        on_close,
        on_opened,
        on_closed,
        on_click,
        on_click_overlay,
        on_click_close_icon,
        on_update_value,
    } = props;

    let gesture: Rc<dyn GestureClassifier> =
        gesture.unwrap_or_else(|| Rc::new(DistanceClassifier::default()));
    let transition: Rc<dyn Transition> = transition.unwrap_or_else(|| Rc::new(InstantTransition));

    let inner = Rc::new_cyclic(|weak: &Weak<PopupInner>| {
        let overlay_target = weak.clone();
        let on_activate: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(inner) = overlay_target.upgrade() {
                inner.on_overlay_activate();
            }
        });

        PopupInner {
            weak: weak.clone(),
            state: RefCell::new(PopupState {
                visible: false,
                rendered: false,
                destroyed: false,
                lock_held: false,
                should_reopen: false,
                overlay_enabled: overlay.get(),
                lock_scroll: lock_scroll.get(),
                teleport,
                z_index,
                assigned_z: None,
                duration,
                position,
                round,
                closeable,
                close_icon,
                close_on_click_overlay,
                id,
                class,
                root: None,
                close_icon_node: None,
                generation: 0,
            }),
            natural_parent,
            callbacks: Callbacks {
                on_open,
                on_close,
                on_opened,
                on_closed,
                on_click,
                on_click_overlay,
                on_click_close_icon,
                on_update_value,
            },
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
            children: RefCell::new(children),
            transition,
            overlay: OverlayController::new(gesture, on_activate),
            scope_stop: RefCell::new(None),
        }
    });

    // A teleported root is outside the natural parent's subtree.
    let parent_target = Rc::downgrade(&inner);
    on_destroy(natural_parent, move || {
        if let Some(inner) = parent_target.upgrade() {
            inner.teardown(true);
        }
    });

    bind_props(&inner, value, overlay, lock_scroll);

    Popup { inner }
}

/// Watch reactive props. Static `value: true` opens right away.
fn bind_props(
    inner: &Rc<PopupInner>,
    value: PropValue<bool>,
    overlay: PropValue<bool>,
    lock_scroll: PropValue<bool>,
) {
    let reactive = overlay.is_reactive() || lock_scroll.is_reactive() || value.is_reactive();
    if !reactive {
        if value.get() {
            inner.apply_visible(true, Origin::Binding);
        }
        return;
    }

    let scope = effect_scope(false);
    let overlay_target = inner.weak.clone();
    let lock_target = inner.weak.clone();
    let value_target = inner.weak.clone();

    scope.run(move || {
        if overlay.is_reactive() {
            let _effect_cleanup = effect(move || {
                let enabled = overlay.get();
                if let Some(inner) = overlay_target.upgrade() {
                    outside_effect(|| inner.set_overlay(enabled));
                }
            });
        }

        if lock_scroll.is_reactive() {
            let _effect_cleanup = effect(move || {
                let on = lock_scroll.get();
                if let Some(inner) = lock_target.upgrade() {
                    outside_effect(|| inner.set_lock_scroll(on));
                }
            });
        }

        if value.is_reactive() {
            let _effect_cleanup = effect(move || {
                let visible = value.get();
                if let Some(inner) = value_target.upgrade() {
                    outside_effect(|| inner.apply_visible(visible, Origin::Binding));
                }
            });
        } else if value.get() {
            if let Some(inner) = value_target.upgrade() {
                inner.apply_visible(true, Origin::Binding);
            }
        }
    });

    *inner.scope_stop.borrow_mut() = Some(Box::new(move || scope.stop()));
}

/// Run `f` with no active reaction or effect.
///
/// Open renders content, and content creates its own effects. Run from inside
/// a prop watcher, those effects would become children of the watcher and be
/// destroyed the next time the watched value changes.
fn outside_effect<R>(f: impl FnOnce() -> R) -> R {
    struct Restore {
        reaction: Option<Weak<dyn AnyReaction>>,
        effect: Option<Weak<dyn AnyReaction>>,
    }

    impl Drop for Restore {
        fn drop(&mut self) {
            let reaction = self.reaction.take();
            let effect = self.effect.take();
            with_context(|ctx| {
                ctx.set_active_reaction(reaction);
                ctx.set_active_effect(effect);
            });
        }
    }

    let (reaction, effect) =
        with_context(|ctx| (ctx.set_active_reaction(None), ctx.set_active_effect(None)));
    let _restore = Restore { reaction, effect };
    f()
}

// =============================================================================
// Core Behavior
// =============================================================================

impl PopupInner {
    fn emit(&self, event: PopupEvent) {
        trace!(%event, root = ?self.state.borrow().root, "popup event");
        let listeners: Vec<PopupListener> =
            self.listeners.borrow().iter().map(|(_, l)| l.clone()).collect();
        // Handlers may read signals; that must not subscribe the caller.
        untrack(|| {
            self.callbacks.call(event);
            for listener in listeners {
                listener(&event);
            }
        });
    }

    fn is_visible(&self) -> bool {
        self.state.borrow().visible
    }

    fn apply_visible(&self, next: bool, origin: Origin) {
        if next {
            self.open(origin);
        } else {
            self.close(origin);
        }
    }

    fn open(&self, origin: Origin) {
        let generation = {
            let mut st = self.state.borrow_mut();
            if st.destroyed || st.visible {
                return;
            }
            st.visible = true;
            st.should_reopen = false;
            st.generation += 1;
            st.generation
        };
        debug!(natural_parent = self.natural_parent, "popup open");

        self.emit(PopupEvent::Open);
        if origin == Origin::Api {
            self.emit(PopupEvent::UpdateValue(true));
        }
        // A listener may have closed it again
        if !self.is_visible() {
            return;
        }

        let root = self.ensure_rendered();
        self.reconcile_teleport();
        let z = self.stack_z();
        core::set_z_index(root, z);
        core::set_visible(root, true);

        self.run_transition(TransitionDirection::Enter, generation);

        let acquire = {
            let mut st = self.state.borrow_mut();
            let acquire = st.lock_scroll && !st.lock_held && st.visible;
            if acquire {
                st.lock_held = true;
            }
            acquire
        };
        if acquire {
            scroll_lock::acquire();
        }

        self.schedule_overlay();
    }

    fn close(&self, origin: Origin) {
        let generation = {
            let mut st = self.state.borrow_mut();
            if st.destroyed || !st.visible {
                return;
            }
            st.visible = false;
            st.generation += 1;
            if origin == Origin::Deactivate {
                st.should_reopen = true;
            }
            st.generation
        };
        debug!(natural_parent = self.natural_parent, ?origin, "popup close");

        self.overlay.hide();
        self.release_lock();

        if origin != Origin::Deactivate {
            self.emit(PopupEvent::Close);
        }
        if origin != Origin::Binding {
            self.emit(PopupEvent::UpdateValue(false));
        }
        self.run_transition(TransitionDirection::Leave, generation);
    }

    fn release_lock(&self) {
        let held = std::mem::replace(&mut self.state.borrow_mut().lock_held, false);
        if held {
            debug_assert!(scroll_lock::lock_count() > 0, "popup held a lock the registry lost");
            scroll_lock::release();
        }
    }

    fn run_transition(&self, direction: TransitionDirection, generation: u64) {
        let request = {
            let st = self.state.borrow();
            if st.generation != generation {
                return;
            }
            TransitionRequest::new(st.position.transition_name(), direction, st.duration)
        };

        let target = self.weak.clone();
        self.transition.run(
            request,
            Box::new(move || {
                if let Some(inner) = target.upgrade() {
                    inner.finish_transition(direction, generation);
                }
            }),
        );
    }

    fn finish_transition(&self, direction: TransitionDirection, generation: u64) {
        let root = {
            let st = self.state.borrow();
            if st.destroyed || st.generation != generation {
                trace!(?direction, "stale transition completion dropped");
                return;
            }
            st.root
        };

        match direction {
            TransitionDirection::Enter => self.emit(PopupEvent::Opened),
            TransitionDirection::Leave => {
                if let Some(root) = root {
                    core::set_visible(root, false);
                }
                self.emit(PopupEvent::Closed);
            }
        }
    }

    /// Overlay insertion waits for the next flush and re-reads state then.
    fn schedule_overlay(&self) {
        let target = self.weak.clone();
        next_tick(move || {
            let Some(inner) = target.upgrade() else { return };
            let (show, root) = {
                let st = inner.state.borrow();
                (st.visible && st.overlay_enabled && !st.destroyed, st.root)
            };
            match root {
                Some(root) if show => {
                    let z = inner.stack_z();
                    inner.overlay.show(root, z);
                }
                _ => trace!("overlay render skipped"),
            }
        });
    }

    /// Explicit z-index, or the one assigned on first show.
    fn stack_z(&self) -> i32 {
        let mut st = self.state.borrow_mut();
        if let Some(z) = st.z_index {
            return z;
        }
        *st.assigned_z.get_or_insert_with(next_z_index)
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    fn ensure_rendered(&self) -> usize {
        let (id, class, position, round, closeable) = {
            let st = self.state.borrow();
            if let Some(root) = st.root {
                return root;
            }
            (st.id.clone(), st.class.clone(), st.position, st.round, st.closeable)
        };

        let root = allocate_index(id.as_deref());
        core::set_kind(root, NodeKind::Popup);
        core::add_class(root, POPUP_CLASS);
        core::add_class(root, &position_class(position));
        core::toggle_class(root, ROUND_CLASS, round);
        if let Some(class) = &class {
            add_class_list(root, class);
        }
        core::set_visible(root, false);

        if let Err(err) = append_child(self.natural_parent, root) {
            debug!(root, natural_parent = self.natural_parent, %err, "natural parent unusable");
        }

        {
            let mut st = self.state.borrow_mut();
            st.root = Some(root);
            st.rendered = true;
        }

        let click_target = self.weak.clone();
        let remove_handlers = mouse::on_component(root, MouseHandlers {
            on_click: Some(Rc::new(move |_: &MouseEvent| {
                if let Some(inner) = click_target.upgrade() {
                    inner.on_surface_click();
                }
            })),
            ..Default::default()
        });

        let destroy_target = self.weak.clone();
        on_destroy(root, move || {
            remove_handlers();
            mouse::cleanup_index(root);
            if let Some(inner) = destroy_target.upgrade() {
                inner.teardown(false);
            }
        });

        let children = self.children.borrow_mut().take();
        if let Some(children) = children {
            push_parent_context(root);
            children();
            pop_parent_context();
        }

        if closeable {
            self.ensure_close_icon(root);
        }

        debug!(root, "popup content rendered");
        root
    }

    fn ensure_close_icon(&self, root: usize) {
        let icon_name = {
            let st = self.state.borrow();
            if st.close_icon_node.is_some() {
                return;
            }
            st.close_icon.clone()
        };

        let icon = allocate_index(None);
        core::set_kind(icon, NodeKind::Icon);
        core::add_class(icon, CLOSE_ICON_CLASS);
        core::set_label(icon, &icon_name);
        if let Err(err) = append_child(root, icon) {
            debug!(icon, root, %err, "close icon left detached");
        }

        let click_target = self.weak.clone();
        let remove_handlers = mouse::on_component(icon, MouseHandlers {
            on_click: Some(Rc::new(move |_: &MouseEvent| {
                if let Some(inner) = click_target.upgrade() {
                    inner.on_close_icon_activate();
                }
            })),
            ..Default::default()
        });

        let destroy_target = self.weak.clone();
        on_destroy(icon, move || {
            remove_handlers();
            mouse::cleanup_index(icon);
            if let Some(inner) = destroy_target.upgrade() {
                let mut st = inner.state.borrow_mut();
                if st.close_icon_node == Some(icon) {
                    st.close_icon_node = None;
                }
            }
        });

        self.state.borrow_mut().close_icon_node = Some(icon);
    }

    fn remove_close_icon(&self) {
        let icon = self.state.borrow_mut().close_icon_node.take();
        if let Some(icon) = icon {
            release_index(icon);
        }
    }

    // =========================================================================
    // Teleport
    // =========================================================================

    fn reconcile_teleport(&self) {
        let (root, teleport) = {
            let st = self.state.borrow();
            (st.root, st.teleport.clone())
        };
        let Some(root) = root else { return };

        let container = resolve_container(Some(self.natural_parent), &teleport, Some(root));
        if let Some(container) = container {
            if parent_of(root) != Some(container) {
                match append_child(container, root) {
                    Ok(()) => trace!(root, container, "popup root moved"),
                    Err(err) => debug!(root, container, %err, "popup root not moved"),
                }
            }
        }
        self.overlay.reposition(root);
    }

    // =========================================================================
    // Interaction
    // =========================================================================

    fn on_overlay_activate(&self) {
        let close = {
            let st = self.state.borrow();
            if !st.visible || st.destroyed {
                return;
            }
            st.close_on_click_overlay
        };
        self.emit(PopupEvent::ClickOverlay);
        if close {
            self.close(Origin::Api);
        }
    }

    fn on_close_icon_activate(&self) {
        {
            let st = self.state.borrow();
            if !st.visible || !st.closeable || st.destroyed {
                return;
            }
        }
        self.emit(PopupEvent::ClickCloseIcon);
        self.close(Origin::Api);
    }

    fn on_surface_click(&self) {
        let rendered = {
            let st = self.state.borrow();
            st.rendered && !st.destroyed
        };
        if rendered {
            self.emit(PopupEvent::Click);
        }
    }

    // =========================================================================
    // Settings
    // =========================================================================

    fn set_overlay(&self, enabled: bool) {
        let visible = {
            let mut st = self.state.borrow_mut();
            if st.destroyed {
                return;
            }
            st.overlay_enabled = enabled;
            st.visible
        };
        if !enabled {
            self.overlay.hide();
        } else if visible {
            self.schedule_overlay();
        }
    }

    fn set_lock_scroll(&self, on: bool) {
        let acquire = {
            let mut st = self.state.borrow_mut();
            if st.destroyed {
                return;
            }
            st.lock_scroll = on;
            let acquire = on && st.visible && !st.lock_held;
            if acquire {
                st.lock_held = true;
            }
            acquire
        };
        if acquire {
            scroll_lock::acquire();
        } else if !on {
            self.release_lock();
        }
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    fn teardown(&self, release_root: bool) {
        let root = {
            let mut st = self.state.borrow_mut();
            if st.destroyed {
                return;
            }
            st.destroyed = true;
            st.visible = false;
            st.generation += 1;
            st.close_icon_node = None;
            st.root.take()
        };

        self.release_lock();
        if let Some(stop) = self.scope_stop.borrow_mut().take() {
            stop();
        }
        self.overlay.destroy();

        if let Some(root) = root {
            mouse::cleanup_index(root);
            if release_root && is_allocated(root) {
                release_index(root);
            }
        }
        self.listeners.borrow_mut().clear();
        debug!(?root, "popup destroyed");
    }
}

impl Drop for PopupInner {
    fn drop(&mut self) {
        self.teardown(true);
    }
}

// =============================================================================
// Public Handle
// =============================================================================

impl Popup {
    /// Show or hide. Emits open/close and `UpdateValue`; no-op if unchanged.
    pub fn set_visible(&self, visible: bool) {
        self.inner.apply_visible(visible, Origin::Api);
    }

    pub fn is_visible(&self) -> bool {
        self.inner.is_visible()
    }

    /// Has the content been rendered? Stays true once set.
    pub fn is_rendered(&self) -> bool {
        self.inner.state.borrow().rendered
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.state.borrow().destroyed
    }

    /// Does this popup currently hold a scroll-lock slot?
    pub fn lock_held(&self) -> bool {
        self.inner.state.borrow().lock_held
    }

    /// Re-resolve the teleport target and move the root there.
    ///
    /// Content, lock and overlay state are untouched. No-op before first render.
    pub fn reconcile_teleport(&self) {
        self.inner.reconcile_teleport();
    }

    /// A tap reached the overlay.
    pub fn on_overlay_activate(&self) {
        self.inner.on_overlay_activate();
    }

    /// The close icon was tapped.
    pub fn on_close_icon_activate(&self) {
        self.inner.on_close_icon_activate();
    }

    /// The popup surface was tapped.
    pub fn on_surface_click(&self) {
        self.inner.on_surface_click();
    }

    /// Keep-alive: hide silently and remember to reopen.
    pub fn deactivate(&self) {
        self.inner.close(Origin::Deactivate);
    }

    /// Keep-alive: reopen if the last deactivation hid a visible popup.
    pub fn activate(&self) {
        let reopen = std::mem::replace(&mut self.inner.state.borrow_mut().should_reopen, false);
        if reopen {
            self.inner.open(Origin::Api);
        }
    }

    /// Tear down: release the lock, remove the overlay, release the root.
    pub fn destroy(&self) {
        self.inner.teardown(true);
    }

    /// Observe every event. Returns cleanup function.
    pub fn subscribe(&self, listener: impl Fn(&PopupEvent) + 'static) -> impl FnOnce() {
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));

        let target = self.inner.weak.clone();
        move || {
            if let Some(inner) = target.upgrade() {
                inner.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
            }
        }
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Change the teleport target and move the root right away.
    pub fn set_teleport(&self, teleport: impl Into<Teleport>) {
        self.inner.state.borrow_mut().teleport = teleport.into();
        self.inner.reconcile_teleport();
    }

    /// Enabling shows the overlay on the next flush; disabling hides it now.
    pub fn set_overlay(&self, enabled: bool) {
        self.inner.set_overlay(enabled);
    }

    /// Takes or gives back a lock slot right away if visible.
    pub fn set_lock_scroll(&self, on: bool) {
        self.inner.set_lock_scroll(on);
    }

    /// Explicit z-index. `None` falls back to the globally assigned value.
    pub fn set_z_index(&self, z_index: Option<i32>) {
        let root = {
            let mut st = self.inner.state.borrow_mut();
            st.z_index = z_index;
            st.root
        };
        if let Some(root) = root {
            let z = self.inner.stack_z();
            core::set_z_index(root, z);
            self.inner.overlay.restack(z);
        }
    }

    pub fn set_position(&self, position: Position) {
        let (old, root) = {
            let mut st = self.inner.state.borrow_mut();
            (std::mem::replace(&mut st.position, position), st.root)
        };
        if let Some(root) = root {
            core::remove_class(root, &position_class(old));
            core::add_class(root, &position_class(position));
        }
    }

    pub fn set_round(&self, round: bool) {
        let root = {
            let mut st = self.inner.state.borrow_mut();
            st.round = round;
            st.root
        };
        if let Some(root) = root {
            core::toggle_class(root, ROUND_CLASS, round);
        }
    }

    /// Adds or removes the close icon on a rendered popup.
    pub fn set_closeable(&self, closeable: bool) {
        let root = {
            let mut st = self.inner.state.borrow_mut();
            st.closeable = closeable;
            st.root
        };
        let Some(root) = root else { return };
        if closeable {
            self.inner.ensure_close_icon(root);
        } else {
            self.inner.remove_close_icon();
        }
    }

    pub fn set_close_icon(&self, name: &str) {
        let icon = {
            let mut st = self.inner.state.borrow_mut();
            st.close_icon = name.to_string();
            st.close_icon_node
        };
        if let Some(icon) = icon {
            core::set_label(icon, name);
        }
    }

    /// Transition duration in seconds, used from the next transition on.
    pub fn set_duration(&self, duration: Option<f32>) {
        self.inner.state.borrow_mut().duration = duration;
    }

    pub fn set_close_on_click_overlay(&self, close: bool) {
        self.inner.state.borrow_mut().close_on_click_overlay = close;
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn root_node(&self) -> Option<usize> {
        self.inner.state.borrow().root
    }

    pub fn overlay_node(&self) -> Option<usize> {
        self.inner.overlay.node()
    }

    pub fn overlay_visible(&self) -> bool {
        self.inner.overlay.is_visible()
    }

    pub fn close_icon_node(&self) -> Option<usize> {
        self.inner.state.borrow().close_icon_node
    }

    /// Effective z-index (explicit or assigned); `None` before first show.
    pub fn z_index(&self) -> Option<i32> {
        let st = self.inner.state.borrow();
        st.z_index.or(st.assigned_z)
    }

    pub fn position(&self) -> Position {
        self.inner.state.borrow().position
    }

    pub fn natural_parent(&self) -> usize {
        self.inner.natural_parent
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::box_primitive::box_primitive;
    use super::super::types::BoxProps;
    use crate::engine::{children, get_index, reset_registry};
    use crate::pipeline::{flush, reset_scheduler};
    use crate::state::mouse::reset_mouse_state;
    use crate::state::scroll_lock::{lock_count, reset_scroll_lock};
    use crate::state::stacking::{reset_z_index, BASE_Z_INDEX};
    use crate::state::transition::DeferredTransition;
    use spark_signals::signal;

    fn setup() {
        reset_registry();
        reset_mouse_state();
        reset_scroll_lock();
        reset_scheduler();
        reset_z_index();
    }

    fn record(p: &Popup) -> Rc<RefCell<Vec<PopupEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        let _unsubscribe = p.subscribe(move |e| l.borrow_mut().push(*e));
        log
    }

    #[test]
    fn test_lazy_render() {
        setup();
        let p = popup(PopupProps::default());

        assert!(!p.is_rendered());
        assert_eq!(p.root_node(), None);

        p.set_visible(true);
        let root = p.root_node().unwrap();
        assert!(p.is_rendered());
        assert_eq!(core::get_kind(root), NodeKind::Popup);
        assert!(core::has_class(root, "spark-popup--center"));

        p.set_visible(false);
        assert_eq!(p.root_node(), Some(root));
        assert!(!core::get_visible(root));
        assert!(p.is_rendered());
    }

    #[test]
    fn test_event_order() {
        setup();
        let p = popup(PopupProps::default());
        let log = record(&p);

        p.set_visible(true);
        p.set_visible(false);

        assert_eq!(
            *log.borrow(),
            vec![
                PopupEvent::Open,
                PopupEvent::UpdateValue(true),
                PopupEvent::Opened,
                PopupEvent::Close,
                PopupEvent::UpdateValue(false),
                PopupEvent::Closed,
            ]
        );
    }

    #[test]
    fn test_redundant_calls_are_silent() {
        setup();
        let p = popup(PopupProps::default());
        let log = record(&p);

        p.set_visible(false);
        assert!(log.borrow().is_empty());

        p.set_visible(true);
        let after_open = log.borrow().len();
        p.set_visible(true);
        assert_eq!(log.borrow().len(), after_open);
    }

    #[test]
    fn test_z_index_assignment() {
        setup();
        let a = popup(PopupProps::default());
        let b = popup(PopupProps {
            z_index: Some(10),
            ..Default::default()
        });

        assert_eq!(a.z_index(), None);
        a.set_visible(true);
        b.set_visible(true);
        flush();

        assert_eq!(a.z_index(), Some(BASE_Z_INDEX + 2));
        assert_eq!(core::get_z_index(a.root_node().unwrap()), BASE_Z_INDEX + 2);
        assert_eq!(core::get_z_index(b.root_node().unwrap()), 10);
        assert_eq!(core::get_z_index(b.overlay_node().unwrap()), 9);

        // Assigned once
        a.set_visible(false);
        a.set_visible(true);
        assert_eq!(a.z_index(), Some(BASE_Z_INDEX + 2));

        b.set_z_index(Some(50));
        assert_eq!(core::get_z_index(b.overlay_node().unwrap()), 49);
    }

    #[test]
    fn test_overlay_deferred_and_cancelled() {
        setup();
        let p = popup(PopupProps::default());

        p.set_visible(true);
        assert_eq!(p.overlay_node(), None);
        flush();
        let overlay = p.overlay_node().unwrap();
        let root = p.root_node().unwrap();
        assert!(p.overlay_visible());
        assert_eq!(children(parent_of(root).unwrap()), vec![overlay, root]);

        p.set_visible(false);
        assert!(!p.overlay_visible());

        // Hidden before the flush: no flash
        p.set_visible(true);
        p.set_visible(false);
        flush();
        assert!(!p.overlay_visible());
    }

    #[test]
    fn test_lock_released_on_destroy() {
        setup();
        let p = popup(PopupProps::default());
        p.set_visible(true);
        flush();
        let overlay = p.overlay_node().unwrap();
        let root = p.root_node().unwrap();
        assert_eq!(lock_count(), 1);

        p.destroy();

        assert_eq!(lock_count(), 0);
        assert!(!is_allocated(overlay));
        assert!(!is_allocated(root));
        assert!(p.is_destroyed());

        // Everything is a no-op afterwards
        p.set_visible(true);
        assert_eq!(lock_count(), 0);
    }

    #[test]
    fn test_drop_releases_lock() {
        setup();
        {
            let p = popup(PopupProps::default());
            p.set_visible(true);
            assert_eq!(lock_count(), 1);
        }
        assert_eq!(lock_count(), 0);
    }

    #[test]
    fn test_external_release_tears_down() {
        setup();
        let p = popup(PopupProps::default());
        p.set_visible(true);
        let root = p.root_node().unwrap();

        release_index(root);

        assert!(p.is_destroyed());
        assert_eq!(lock_count(), 0);
        assert_eq!(p.root_node(), None);
    }

    #[test]
    fn test_deferred_transition_and_stale_completion() {
        setup();
        let p = popup(PopupProps {
            transition: Some(Rc::new(DeferredTransition)),
            ..Default::default()
        });
        let log = record(&p);

        p.set_visible(true);
        p.set_visible(false);
        let root = p.root_node().unwrap();
        // Leave not finished yet: still shown
        assert!(core::get_visible(root));

        flush();

        let events = log.borrow();
        assert!(!events.contains(&PopupEvent::Opened));
        assert_eq!(events.iter().filter(|e| **e == PopupEvent::Closed).count(), 1);
        assert!(!core::get_visible(root));
    }

    #[test]
    fn test_signal_binding_without_echo() {
        setup();
        let show = signal(false);
        let updates = Rc::new(RefCell::new(Vec::new()));
        let u = updates.clone();
        let p = popup(PopupProps {
            value: show.clone().into(),
            on_update_value: Some(Rc::new(move |v: bool| u.borrow_mut().push(v))),
            ..Default::default()
        });

        show.set(true);
        assert!(p.is_visible());
        show.set(false);
        assert!(!p.is_visible());
        assert!(updates.borrow().is_empty());

        show.set(true);
        p.on_overlay_activate();
        assert_eq!(*updates.borrow(), vec![false]);
    }

    #[test]
    fn test_content_effects_survive_value_changes() {
        setup();
        let show = signal(false);
        let content_visible = signal(true);
        let cv = content_visible.clone();
        let p = popup(PopupProps {
            children: Some(Box::new(move || {
                box_primitive(BoxProps {
                    id: Some("content".into()),
                    visible: Some(cv.into()),
                    ..Default::default()
                });
            })),
            ..PopupProps::model(show.clone())
        });

        show.set(true);
        let content = get_index("content").unwrap();
        show.set(false);
        show.set(true);
        assert!(p.is_visible());

        content_visible.set(false);
        assert!(!core::get_visible(content));
        content_visible.set(true);
        assert!(core::get_visible(content));
    }

    #[test]
    fn test_keep_alive() {
        setup();
        let p = popup(PopupProps::default());
        let log = record(&p);

        // Not visible: nothing to reopen
        p.deactivate();
        p.activate();
        assert!(!p.is_visible());

        p.set_visible(true);
        log.borrow_mut().clear();

        p.deactivate();
        assert!(!p.is_visible());
        assert_eq!(lock_count(), 0);
        assert!(!log.borrow().contains(&PopupEvent::Close));
        assert!(log.borrow().contains(&PopupEvent::UpdateValue(false)));

        p.activate();
        assert!(p.is_visible());
        assert_eq!(lock_count(), 1);
    }

    #[test]
    fn test_close_icon_lifecycle() {
        setup();
        let p = popup(PopupProps {
            closeable: true,
            close_icon: "close".into(),
            ..Default::default()
        });
        p.set_visible(true);
        let root = p.root_node().unwrap();
        let icon = p.close_icon_node().unwrap();

        assert_eq!(children(root), vec![icon]);
        assert_eq!(core::get_label(icon), "close");
        assert!(core::has_class(icon, CLOSE_ICON_CLASS));

        p.set_close_icon("success");
        assert_eq!(core::get_label(icon), "success");

        p.set_closeable(false);
        assert_eq!(p.close_icon_node(), None);
        assert!(!is_allocated(icon));

        // Not closeable: activation ignored
        p.on_close_icon_activate();
        assert!(p.is_visible());
    }

    #[test]
    fn test_presentation_setters() {
        setup();
        let p = popup(PopupProps {
            class: Some("sheet".into()),
            ..Default::default()
        });
        p.set_visible(true);
        let root = p.root_node().unwrap();
        assert!(core::has_class(root, "sheet"));

        p.set_position(Position::Bottom);
        assert!(core::has_class(root, "spark-popup--bottom"));
        assert!(!core::has_class(root, "spark-popup--center"));

        p.set_round(true);
        assert!(core::has_class(root, ROUND_CLASS));
        p.set_round(false);
        assert!(!core::has_class(root, ROUND_CLASS));
    }

    #[test]
    fn test_lock_scroll_toggle_while_visible() {
        setup();
        let p = popup(PopupProps::default());
        p.set_visible(true);
        assert!(p.lock_held());

        p.set_lock_scroll(false);
        assert!(!p.lock_held());
        assert_eq!(lock_count(), 0);

        p.set_lock_scroll(true);
        assert!(p.lock_held());
        assert_eq!(lock_count(), 1);
    }
}
