//! Popup integration tests.
//!
//! Drive popups through the public API and through real mouse dispatch:
//! lazy render, teleport, scroll-lock counting, overlay coupling, gestures.
//!
//! Run with: cargo test --test popup

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_popup::engine::arrays::core;
use spark_popup::primitives::{OVERLAY_CLASS, POPUP_CLASS};
use spark_popup::state::mouse::{self, dispatch, fill_hit_rect, MouseButton, MouseEvent, ScrollDirection};
use spark_popup::state::scroll_lock::{self, is_locked, lock_count, LOCK_CLASS};
use spark_popup::state::stacking::BASE_Z_INDEX;
use spark_popup::{
    allocate_index, append_child, box_primitive, children, document_body, flush, get_index,
    is_allocated, parent_of, pop_parent_context, popup, push_parent_context, release_index,
    reset_all, BoxProps, Popup, PopupEvent, PopupProps, Position, Teleport,
};
use spark_signals::{effect, signal};

// =============================================================================
// HELPERS
// =============================================================================

fn setup() {
    reset_all();
    mouse::clear_hit_grid();
}

fn click(x: u16, y: u16) {
    dispatch(MouseEvent::down(MouseButton::Left, x, y));
    dispatch(MouseEvent::up(MouseButton::Left, x, y));
}

/// Paint a shown popup: overlay full screen, popup box on top.
fn paint(p: &Popup) {
    if let Some(overlay) = p.overlay_node() {
        fill_hit_rect(0, 0, 80, 24, overlay);
    }
    if let Some(root) = p.root_node() {
        fill_hit_rect(20, 8, 40, 8, root);
    }
    if let Some(icon) = p.close_icon_node() {
        fill_hit_rect(58, 8, 2, 1, icon);
    }
}

fn events(p: &Popup) -> Rc<RefCell<Vec<PopupEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    let _unsubscribe = p.subscribe(move |e| l.borrow_mut().push(*e));
    log
}

// =============================================================================
// LAZY RENDER
// =============================================================================

#[test]
fn content_renders_once_on_first_show() {
    setup();
    let renders = Rc::new(Cell::new(0));
    let r = renders.clone();

    let p = popup(PopupProps {
        children: Some(Box::new(move || {
            r.set(r.get() + 1);
            box_primitive(BoxProps {
                id: Some("sheet-body".into()),
                ..Default::default()
            });
        })),
        ..Default::default()
    });

    assert_eq!(renders.get(), 0);
    assert_eq!(get_index("sheet-body"), None);

    p.set_visible(true);
    p.set_visible(false);
    p.set_visible(true);

    assert_eq!(renders.get(), 1);
    let root = p.root_node().unwrap();
    assert_eq!(parent_of(get_index("sheet-body").unwrap()), Some(root));
    assert!(core::has_class(root, POPUP_CLASS));
}

#[test]
fn hidden_popup_keeps_content() {
    setup();
    let p = popup(PopupProps {
        children: Some(Box::new(|| {
            box_primitive(BoxProps {
                id: Some("kept".into()),
                ..Default::default()
            });
        })),
        ..Default::default()
    });

    p.set_visible(true);
    let content = get_index("kept").unwrap();
    p.set_visible(false);

    assert!(is_allocated(content));
    assert!(!core::get_visible(p.root_node().unwrap()));
}

// =============================================================================
// SCROLL LOCK
// =============================================================================

#[test]
fn two_popups_share_the_lock() {
    setup();
    let a = popup(PopupProps::default());
    let b = popup(PopupProps::default());
    let body = document_body();

    a.set_visible(true);
    b.set_visible(true);
    assert_eq!(lock_count(), 2);
    assert!(core::has_class(body, LOCK_CLASS));

    a.set_visible(false);
    assert_eq!(lock_count(), 1);
    assert!(core::has_class(body, LOCK_CLASS));

    b.set_visible(false);
    assert_eq!(lock_count(), 0);
    assert!(!core::has_class(body, LOCK_CLASS));
}

#[test]
fn lock_count_tracks_any_interleaving() {
    setup();
    let popups: Vec<Popup> = (0..5).map(|_| popup(PopupProps::default())).collect();

    for p in &popups {
        p.set_visible(true);
    }
    assert_eq!(lock_count(), 5);

    for i in [3, 0, 4] {
        popups[i].set_visible(false);
    }
    // Redundant hides do not release twice
    popups[3].set_visible(false);
    assert_eq!(lock_count(), 2);

    popups[1].destroy();
    assert_eq!(lock_count(), 1);
    assert!(is_locked());

    popups[2].set_visible(false);
    assert_eq!(lock_count(), 0);
    assert!(!is_locked());
}

#[test]
fn lock_scroll_disabled_takes_no_slot() {
    setup();
    let p = popup(PopupProps {
        lock_scroll: false.into(),
        ..Default::default()
    });

    p.set_visible(true);
    assert!(!p.lock_held());
    assert_eq!(lock_count(), 0);
}

#[test]
fn locked_signal_is_observable() {
    setup();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    let _effect = effect(move || s.borrow_mut().push(is_locked()));

    let p = popup(PopupProps::default());
    p.set_visible(true);
    p.set_visible(false);

    assert_eq!(*seen.borrow(), vec![false, true, false]);
}

#[test]
fn background_scroll_swallowed_popup_scroll_passes() {
    setup();
    let background = allocate_index(None);
    append_child(document_body(), background).unwrap();

    let scrolled = Rc::new(Cell::new(0));
    let s = scrolled.clone();
    let _global = mouse::on_scroll(move |_| {
        s.set(s.get() + 1);
        true
    });

    let p = popup(PopupProps {
        overlay: false.into(),
        ..Default::default()
    });
    p.set_visible(true);
    fill_hit_rect(0, 0, 80, 24, background);
    paint(&p);

    // Background: swallowed by the lock
    assert!(dispatch(MouseEvent::scroll(2, 2, ScrollDirection::Down, 1)));
    assert_eq!(scrolled.get(), 0);

    // Inside the popup: reaches handlers
    assert!(dispatch(MouseEvent::scroll(30, 10, ScrollDirection::Down, 1)));
    assert_eq!(scrolled.get(), 1);

    p.set_visible(false);
    assert!(dispatch(MouseEvent::scroll(2, 2, ScrollDirection::Down, 1)));
    assert_eq!(scrolled.get(), 2);
}

#[test]
fn lock_targets_can_exempt_wheel() {
    setup();
    let p = popup(PopupProps::default());
    p.set_visible(true);
    scroll_lock::set_lock_targets(scroll_lock::LockTargets::DRAG);

    let dragged = Rc::new(Cell::new(0));
    let d = dragged.clone();
    let _drag = mouse::on_drag(move |_| {
        d.set(d.get() + 1);
        true
    });

    assert!(!dispatch(MouseEvent::scroll(1, 1, ScrollDirection::Up, 1)));
    assert!(dispatch(MouseEvent::drag(MouseButton::Left, 1, 1)));
    assert_eq!(dragged.get(), 0);
}

// =============================================================================
// TELEPORT
// =============================================================================

#[test]
fn teleport_to_node_selector_and_factory() {
    setup();
    let _page = box_primitive(BoxProps {
        id: Some("page".into()),
        children: Some(Box::new(|| {
            box_primitive(BoxProps {
                class: Some("portal".into()),
                ..Default::default()
            });
        })),
        ..Default::default()
    });
    let page = get_index("page").unwrap();
    let portal = children(page)[0];

    // Declared inside the page
    push_parent_context(page);
    let p = popup(PopupProps::default());
    pop_parent_context();
    assert_eq!(p.natural_parent(), page);

    p.set_visible(true);
    let root = p.root_node().unwrap();
    assert_eq!(parent_of(root), Some(page));

    p.set_teleport(Teleport::Selector(".portal".into()));
    assert_eq!(parent_of(root), Some(portal));

    let body = document_body();
    p.set_teleport(Teleport::factory(move || Some(body)));
    assert_eq!(parent_of(root), Some(body));

    p.set_teleport(Teleport::None);
    assert_eq!(parent_of(root), Some(page));
}

#[test]
fn unusable_teleport_falls_back_to_natural_parent() {
    setup();
    let p = popup(PopupProps {
        teleport: Teleport::Selector("#missing".into()),
        ..Default::default()
    });
    p.set_visible(true);
    let root = p.root_node().unwrap();
    assert_eq!(parent_of(root), Some(p.natural_parent()));

    p.set_teleport(Teleport::Selector("not a selector!".into()));
    assert_eq!(parent_of(root), Some(p.natural_parent()));

    let gone = allocate_index(None);
    release_index(gone);
    p.set_teleport(Teleport::Node(gone));
    assert_eq!(parent_of(root), Some(p.natural_parent()));
}

#[test]
fn teleport_into_own_content_is_rejected() {
    setup();
    let p = popup(PopupProps {
        children: Some(Box::new(|| {
            box_primitive(BoxProps {
                id: Some("inside".into()),
                ..Default::default()
            });
        })),
        ..Default::default()
    });
    p.set_visible(true);
    let root = p.root_node().unwrap();

    p.set_teleport(Teleport::Selector("#inside".into()));

    assert_eq!(parent_of(root), Some(p.natural_parent()));
}

#[test]
fn teleport_before_first_show_moves_nothing() {
    setup();
    let target = allocate_index(None);
    let p = popup(PopupProps::default());

    p.set_teleport(target);
    assert_eq!(p.root_node(), None);
    assert!(children(target).is_empty());

    p.set_visible(true);
    assert_eq!(parent_of(p.root_node().unwrap()), Some(target));
}

#[test]
fn overlay_follows_teleported_root() {
    setup();
    let target = allocate_index(None);
    let p = popup(PopupProps::default());
    p.set_visible(true);
    flush();
    let overlay = p.overlay_node().unwrap();
    let root = p.root_node().unwrap();

    p.set_teleport(target);

    assert_eq!(children(target), vec![overlay, root]);
    assert!(p.overlay_visible());
    assert_eq!(lock_count(), 1);
}

// =============================================================================
// OVERLAY
// =============================================================================

#[test]
fn overlay_appears_after_flush_one_below_popup() {
    setup();
    let p = popup(PopupProps::default());
    p.set_visible(true);

    assert_eq!(p.overlay_node(), None);
    assert_eq!(flush(), 1);

    let overlay = p.overlay_node().unwrap();
    let root = p.root_node().unwrap();
    assert!(core::has_class(overlay, OVERLAY_CLASS));
    assert_eq!(core::get_z_index(root), BASE_Z_INDEX + 2);
    assert_eq!(core::get_z_index(overlay), BASE_Z_INDEX + 1);
}

#[test]
fn overlay_disabled_by_signal() {
    setup();
    let overlay_on = signal(true);
    let p = popup(PopupProps {
        overlay: overlay_on.clone().into(),
        ..Default::default()
    });
    p.set_visible(true);
    flush();
    assert!(p.overlay_visible());

    overlay_on.set(false);
    assert!(!p.overlay_visible());

    overlay_on.set(true);
    assert!(!p.overlay_visible());
    flush();
    assert!(p.overlay_visible());
}

#[test]
fn later_popup_stacks_above() {
    setup();
    let a = popup(PopupProps::default());
    let b = popup(PopupProps::default());
    a.set_visible(true);
    b.set_visible(true);
    flush();

    let (za, zb) = (a.z_index().unwrap(), b.z_index().unwrap());
    assert!(zb > za);
    assert!(core::get_z_index(b.overlay_node().unwrap()) > za);
}

// =============================================================================
// GESTURES
// =============================================================================

#[test]
fn overlay_tap_closes_and_updates_model() {
    setup();
    let show = signal(false);
    let p = popup(PopupProps::model(show.clone()));
    let log = events(&p);

    show.set(true);
    flush();
    paint(&p);

    click(2, 2);

    assert!(!p.is_visible());
    assert!(!show.get());
    assert_eq!(lock_count(), 0);
    let log = log.borrow();
    assert!(log.contains(&PopupEvent::ClickOverlay));
    assert!(log.contains(&PopupEvent::UpdateValue(false)));
}

#[test]
fn overlay_drag_does_not_close() {
    setup();
    let p = popup(PopupProps::default());
    let log = events(&p);
    p.set_visible(true);
    flush();
    paint(&p);

    dispatch(MouseEvent::down(MouseButton::Left, 2, 2));
    dispatch(MouseEvent::drag(MouseButton::Left, 2, 12));
    dispatch(MouseEvent::up(MouseButton::Left, 2, 2 + 20));

    assert!(p.is_visible());
    assert!(!log.borrow().contains(&PopupEvent::ClickOverlay));
}

#[test]
fn overlay_tap_without_close_on_click() {
    setup();
    let p = popup(PopupProps {
        close_on_click_overlay: false,
        ..Default::default()
    });
    let log = events(&p);
    p.set_visible(true);
    flush();
    paint(&p);

    click(2, 2);

    assert!(p.is_visible());
    assert!(log.borrow().contains(&PopupEvent::ClickOverlay));
}

#[test]
fn close_icon_and_surface_clicks() {
    setup();
    let p = popup(PopupProps {
        closeable: true,
        position: Position::Bottom,
        ..Default::default()
    });
    let log = events(&p);
    p.set_visible(true);
    flush();
    paint(&p);

    click(30, 10);
    assert!(p.is_visible());
    assert!(log.borrow().contains(&PopupEvent::Click));

    click(58, 8);
    assert!(!p.is_visible());
    let log = log.borrow();
    assert!(log.contains(&PopupEvent::ClickCloseIcon));
    assert!(log.contains(&PopupEvent::Close));
}

// =============================================================================
// LIFECYCLE
// =============================================================================

#[test]
fn destroy_while_visible_cleans_everything() {
    setup();
    let p = popup(PopupProps {
        closeable: true,
        ..Default::default()
    });
    p.set_visible(true);
    flush();
    let (root, overlay, icon) = (
        p.root_node().unwrap(),
        p.overlay_node().unwrap(),
        p.close_icon_node().unwrap(),
    );

    p.destroy();

    assert_eq!(lock_count(), 0);
    for node in [root, overlay, icon] {
        assert!(!is_allocated(node));
    }
    assert!(children(document_body()).is_empty());
}

#[test]
fn releasing_natural_parent_destroys_popup() {
    setup();
    let cleanup = box_primitive(BoxProps {
        id: Some("host".into()),
        ..Default::default()
    });
    let host = get_index("host").unwrap();
    push_parent_context(host);
    let p = popup(PopupProps::default());
    pop_parent_context();

    p.set_visible(true);
    flush();
    assert_eq!(lock_count(), 1);

    cleanup();

    assert!(p.is_destroyed());
    assert_eq!(lock_count(), 0);
    assert_eq!(p.overlay_node(), None);
}

#[test]
fn releasing_natural_parent_destroys_teleported_popup() {
    setup();
    let cleanup = box_primitive(BoxProps {
        id: Some("host".into()),
        ..Default::default()
    });
    let host = get_index("host").unwrap();
    push_parent_context(host);
    let p = popup(PopupProps {
        teleport: Teleport::Selector("body".into()),
        ..Default::default()
    });
    pop_parent_context();

    p.set_visible(true);
    flush();
    let root = p.root_node().unwrap();
    assert_eq!(parent_of(root), Some(document_body()));
    assert_eq!(lock_count(), 1);

    cleanup();

    assert!(p.is_destroyed());
    assert_eq!(lock_count(), 0);
    assert!(!is_allocated(root));
    assert_eq!(p.overlay_node(), None);
    assert!(!children(document_body()).contains(&root));
}

#[test]
fn pending_overlay_after_destroy_is_skipped() {
    setup();
    let p = popup(PopupProps::default());
    p.set_visible(true);
    p.destroy();

    flush();
    assert_eq!(p.overlay_node(), None);
}

#[test]
fn static_value_opens_at_creation() {
    setup();
    let p = popup(PopupProps {
        value: true.into(),
        ..Default::default()
    });
    let log = events(&p);

    assert!(p.is_visible());
    assert!(p.is_rendered());
    assert_eq!(lock_count(), 1);
    assert!(log.borrow().is_empty());
}

#[test]
fn keep_alive_round_trip_with_model() {
    setup();
    let show = signal(false);
    let p = popup(PopupProps::model(show.clone()));
    show.set(true);

    p.deactivate();
    assert!(!show.get());
    assert_eq!(lock_count(), 0);

    p.activate();
    assert!(show.get());
    assert!(p.is_visible());
    assert_eq!(lock_count(), 1);
}
