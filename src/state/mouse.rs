//! Mouse Module - Mouse event state and handler registry
//!
//! HitGrid for coordinate-to-node lookup.
//! State and handler registry for mouse events.
//! Does NOT own stdin (that is the input module).
//!
//! # API
//!
//! - `last_event` - Get last mouse event
//! - `mouse_x`, `mouse_y` - Get cursor position
//! - `is_mouse_down` - Get button state
//! - `dispatch(event)` - Dispatch mouse event
//! - `on_component(index, handlers)` - Per-node handlers
//! - `on_click(fn)` - Global click handler
//! - `on_scroll(fn)`, `on_drag(fn)` - Global gesture handlers
//!
//! While the scroll lock is held, scroll and drag gestures outside a visible
//! popup are swallowed here, before any handler runs.
//!
//! # Example
//!
//! ```ignore
//! use spark_popup::state::mouse;
//!
//! let cleanup = mouse::on_component(node, MouseHandlers {
//!     on_click: Some(Rc::new(|event: &MouseEvent| {
//!         println!("Clicked at ({}, {})", event.x, event.y);
//!     })),
//!     ..Default::default()
//! });
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use spark_signals::{signal, Signal};
use tracing::trace;

use super::scroll_lock;
use crate::engine::arrays::core;
use crate::engine::is_allocated;

// =============================================================================
// TYPES
// =============================================================================

/// Modifier key state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

/// Mouse action type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Down,
    Up,
    Move,
    Drag,
    Scroll,
}

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    #[default]
    None,
}

/// Scroll direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Scroll information
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollInfo {
    pub direction: ScrollDirection,
    pub delta: u16,
}

/// Mouse event
#[derive(Debug, Clone, PartialEq)]
pub struct MouseEvent {
    /// Action type (down, up, move, drag, scroll)
    pub action: MouseAction,
    /// Button pressed
    pub button: MouseButton,
    /// X coordinate (0-indexed)
    pub x: u16,
    /// Y coordinate (0-indexed)
    pub y: u16,
    /// Modifier keys state
    pub modifiers: Modifiers,
    /// Scroll info (only for scroll events)
    pub scroll: Option<ScrollInfo>,
    /// Node index at this position (filled by dispatch)
    pub component_index: Option<usize>,
}

impl MouseEvent {
    pub fn new(action: MouseAction, button: MouseButton, x: u16, y: u16) -> Self {
        Self {
            action,
            button,
            x,
            y,
            modifiers: Modifiers::default(),
            scroll: None,
            component_index: None,
        }
    }

    pub fn scroll(x: u16, y: u16, direction: ScrollDirection, delta: u16) -> Self {
        Self {
            scroll: Some(ScrollInfo { direction, delta }),
            ..Self::new(MouseAction::Scroll, MouseButton::None, x, y)
        }
    }

    pub fn down(button: MouseButton, x: u16, y: u16) -> Self {
        Self::new(MouseAction::Down, button, x, y)
    }

    pub fn up(button: MouseButton, x: u16, y: u16) -> Self {
        Self::new(MouseAction::Up, button, x, y)
    }

    pub fn drag(button: MouseButton, x: u16, y: u16) -> Self {
        Self::new(MouseAction::Drag, button, x, y)
    }

    pub fn move_to(x: u16, y: u16) -> Self {
        Self::new(MouseAction::Move, MouseButton::None, x, y)
    }

    pub fn point(&self) -> crate::types::Point {
        crate::types::Point::new(self.x, self.y)
    }
}

// =============================================================================
// HIT GRID - O(1) Coordinate to Node Lookup
// =============================================================================

/// A grid for O(1) mouse hit detection.
///
/// Each cell contains the node index that occupies that position,
/// or `None` if empty. Later fills win, so paint back to front.
pub struct HitGrid {
    width: u16,
    height: u16,
    cells: Vec<usize>,
}

impl HitGrid {
    pub fn new(width: u16, height: u16) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![usize::MAX; size],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Resize the grid, clearing all contents.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let size = width as usize * height as usize;
        self.cells.resize(size, usize::MAX);
        self.clear();
    }

    pub fn clear(&mut self) {
        self.cells.fill(usize::MAX);
    }

    /// Fill a rectangle with a node index, clipped to the grid.
    pub fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16, index: usize) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        for cy in y..y_end {
            for cx in x..x_end {
                let idx = cy as usize * self.width as usize + cx as usize;
                self.cells[idx] = index;
            }
        }
    }

    pub fn get(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.cells.get(idx).copied().filter(|&v| v != usize::MAX)
    }
}

// =============================================================================
// GLOBAL HIT GRID
// =============================================================================

thread_local! {
    static HIT_GRID: RefCell<HitGrid> = RefCell::new(HitGrid::new(80, 24));
}

pub fn resize_hit_grid(width: u16, height: u16) {
    HIT_GRID.with(|g| g.borrow_mut().resize(width, height));
}

pub fn clear_hit_grid() {
    HIT_GRID.with(|g| g.borrow_mut().clear());
}

pub fn fill_hit_rect(x: u16, y: u16, width: u16, height: u16, index: usize) {
    HIT_GRID.with(|g| g.borrow_mut().fill_rect(x, y, width, height, index));
}

/// Get the live, visible node at a position.
///
/// Cells pointing at released or hidden nodes read as empty.
pub fn hit_test(x: u16, y: u16) -> Option<usize> {
    HIT_GRID
        .with(|g| g.borrow().get(x, y))
        .filter(|&idx| is_allocated(idx) && core::get_visible(idx))
}

pub fn hit_grid_size() -> (u16, u16) {
    HIT_GRID.with(|g| {
        let grid = g.borrow();
        (grid.width(), grid.height())
    })
}

// =============================================================================
// REACTIVE STATE
// =============================================================================

thread_local! {
    static LAST_EVENT: Signal<Option<MouseEvent>> = signal(None);
    static MOUSE_X: Signal<u16> = signal(0);
    static MOUSE_Y: Signal<u16> = signal(0);
    static IS_MOUSE_DOWN: Signal<bool> = signal(false);
    static PRESSED_COMPONENT: Signal<Option<usize>> = signal(None);
    static PRESSED_BUTTON: Signal<MouseButton> = signal(MouseButton::None);
}

pub fn last_event() -> Option<MouseEvent> {
    LAST_EVENT.with(|s| s.get())
}

pub fn mouse_x() -> u16 {
    MOUSE_X.with(|s| s.get())
}

pub fn mouse_y() -> u16 {
    MOUSE_Y.with(|s| s.get())
}

pub fn is_mouse_down() -> bool {
    IS_MOUSE_DOWN.with(|s| s.get())
}

/// Get the node the current press started on
pub fn pressed_component() -> Option<usize> {
    PRESSED_COMPONENT.with(|s| s.get())
}

// =============================================================================
// HANDLER TYPES
// =============================================================================

/// Handler for global mouse events. Return true to consume the event.
pub type MouseHandler = Rc<dyn Fn(&MouseEvent) -> bool>;

/// Handlers for a node.
///
/// Handlers are cloned out of the registry before they run, so a handler may
/// register or remove handlers (a click that closes a popup does both).
#[derive(Default, Clone)]
pub struct MouseHandlers {
    pub on_mouse_down: Option<Rc<dyn Fn(&MouseEvent)>>,
    pub on_mouse_up: Option<Rc<dyn Fn(&MouseEvent)>>,
    pub on_click: Option<Rc<dyn Fn(&MouseEvent)>>,
    pub on_scroll: Option<Rc<dyn Fn(&MouseEvent) -> bool>>,
}

// =============================================================================
// HANDLER REGISTRY
// =============================================================================

#[derive(Default)]
struct HandlerRegistry {
    component_handlers: HashMap<usize, MouseHandlers>,
    global_click_handlers: Vec<(usize, MouseHandler)>,
    global_scroll_handlers: Vec<(usize, MouseHandler)>,
    global_drag_handlers: Vec<(usize, MouseHandler)>,
    next_id: usize,
}

impl HandlerRegistry {
    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

thread_local! {
    static REGISTRY: RefCell<HandlerRegistry> = RefCell::new(HandlerRegistry::default());
}

#[derive(Clone, Copy)]
enum GlobalKind {
    Click,
    Scroll,
    Drag,
}

impl HandlerRegistry {
    fn globals(&mut self, kind: GlobalKind) -> &mut Vec<(usize, MouseHandler)> {
        match kind {
            GlobalKind::Click => &mut self.global_click_handlers,
            GlobalKind::Scroll => &mut self.global_scroll_handlers,
            GlobalKind::Drag => &mut self.global_drag_handlers,
        }
    }
}

fn component_handlers(index: usize) -> Option<MouseHandlers> {
    REGISTRY.with(|reg| reg.borrow().component_handlers.get(&index).cloned())
}

fn global_handlers(kind: GlobalKind) -> Vec<MouseHandler> {
    REGISTRY.with(|reg| {
        reg.borrow_mut()
            .globals(kind)
            .iter()
            .map(|(_, h)| h.clone())
            .collect()
    })
}

// =============================================================================
// PUBLIC API - REGISTRATION
// =============================================================================

/// Register handlers for a node. Returns cleanup function.
///
/// Registering again for the same index replaces the previous handlers.
pub fn on_component(index: usize, handlers: MouseHandlers) -> impl FnOnce() {
    REGISTRY.with(|reg| {
        reg.borrow_mut().component_handlers.insert(index, handlers);
    });

    move || {
        REGISTRY.with(|reg| {
            reg.borrow_mut().component_handlers.remove(&index);
        });
    }
}

fn register_global<F>(kind: GlobalKind, handler: F) -> impl FnOnce()
where
    F: Fn(&MouseEvent) -> bool + 'static,
{
    let id = REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        let id = reg.next_id();
        reg.globals(kind).push((id, Rc::new(handler)));
        id
    });

    move || {
        REGISTRY.with(|reg| {
            reg.borrow_mut()
                .globals(kind)
                .retain(|(handler_id, _)| *handler_id != id);
        });
    }
}

/// Register a global click handler. Returns cleanup function.
pub fn on_click<F>(handler: F) -> impl FnOnce()
where
    F: Fn(&MouseEvent) -> bool + 'static,
{
    register_global(GlobalKind::Click, handler)
}

/// Register a global scroll handler. Returns cleanup function.
pub fn on_scroll<F>(handler: F) -> impl FnOnce()
where
    F: Fn(&MouseEvent) -> bool + 'static,
{
    register_global(GlobalKind::Scroll, handler)
}

/// Register a global drag handler. Returns cleanup function.
pub fn on_drag<F>(handler: F) -> impl FnOnce()
where
    F: Fn(&MouseEvent) -> bool + 'static,
{
    register_global(GlobalKind::Drag, handler)
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Dispatch a mouse event to all registered handlers.
/// Returns true if the event was consumed (by a handler or the scroll lock).
pub fn dispatch(mut event: MouseEvent) -> bool {
    // 1. Lookup node from HitGrid
    event.component_index = hit_test(event.x, event.y);

    // 2. Update reactive state
    LAST_EVENT.with(|s| s.set(Some(event.clone())));
    MOUSE_X.with(|s| s.set(event.x));
    MOUSE_Y.with(|s| s.set(event.y));

    match event.action {
        MouseAction::Down => {
            IS_MOUSE_DOWN.with(|s| s.set(true));
        }
        MouseAction::Up => {
            IS_MOUSE_DOWN.with(|s| s.set(false));
        }
        _ => {}
    }

    // 3. Background gestures are swallowed while the document is locked
    if matches!(event.action, MouseAction::Scroll | MouseAction::Drag)
        && scroll_lock::blocks(&event)
    {
        trace!(action = ?event.action, x = event.x, y = event.y, "gesture swallowed by scroll lock");
        return true;
    }

    // 4. Handle specific actions
    match event.action {
        MouseAction::Scroll => dispatch_scroll(&event),
        MouseAction::Drag => dispatch_globals(GlobalKind::Drag, &event),
        MouseAction::Down => dispatch_down(&event),
        MouseAction::Up => dispatch_up(&event),
        MouseAction::Move => false,
    }
}

fn dispatch_globals(kind: GlobalKind, event: &MouseEvent) -> bool {
    global_handlers(kind).iter().any(|handler| handler(event))
}

fn dispatch_scroll(event: &MouseEvent) -> bool {
    // Node handler first
    let on_scroll = event
        .component_index
        .and_then(component_handlers)
        .and_then(|h| h.on_scroll);
    if let Some(on_scroll) = on_scroll {
        if on_scroll(event) {
            return true;
        }
    }

    dispatch_globals(GlobalKind::Scroll, event)
}

fn dispatch_down(event: &MouseEvent) -> bool {
    PRESSED_COMPONENT.with(|s| s.set(event.component_index));
    PRESSED_BUTTON.with(|s| s.set(event.button));

    let on_down = event
        .component_index
        .and_then(component_handlers)
        .and_then(|h| h.on_mouse_down);
    if let Some(on_down) = on_down {
        on_down(event);
    }
    false
}

fn dispatch_up(event: &MouseEvent) -> bool {
    let pressed_idx = PRESSED_COMPONENT.with(|s| s.get());
    let pressed_btn = PRESSED_BUTTON.with(|s| s.get());

    // Clear pressed tracking before handlers run; a click may open another popup
    PRESSED_COMPONENT.with(|s| s.set(None));
    PRESSED_BUTTON.with(|s| s.set(MouseButton::None));

    let on_up = event
        .component_index
        .and_then(component_handlers)
        .and_then(|h| h.on_mouse_up);
    if let Some(on_up) = on_up {
        on_up(event);
    }

    // Click = press and release on the same node with the same button
    if pressed_idx != event.component_index || pressed_btn != event.button {
        return false;
    }

    // Walk up the parent chain until a click handler is found
    let mut current = event.component_index;
    while let Some(idx) = current {
        if let Some(on_click) = component_handlers(idx).and_then(|h| h.on_click) {
            on_click(event);
            break;
        }
        current = core::get_parent_index(idx);
    }

    dispatch_globals(GlobalKind::Click, event)
}

// =============================================================================
// CLEANUP
// =============================================================================

/// Clean up all handlers for a node index.
/// Called when a node is released to prevent leaks.
pub fn cleanup_index(index: usize) {
    REGISTRY.with(|reg| {
        reg.borrow_mut().component_handlers.remove(&index);
    });

    if PRESSED_COMPONENT.with(|s| s.get()) == Some(index) {
        PRESSED_COMPONENT.with(|s| s.set(None));
        PRESSED_BUTTON.with(|s| s.set(MouseButton::None));
    }
}

/// Reset mouse state (for testing)
pub fn reset_mouse_state() {
    REGISTRY.with(|reg| *reg.borrow_mut() = HandlerRegistry::default());

    LAST_EVENT.with(|s| s.set(None));
    MOUSE_X.with(|s| s.set(0));
    MOUSE_Y.with(|s| s.set(0));
    IS_MOUSE_DOWN.with(|s| s.set(false));
    PRESSED_COMPONENT.with(|s| s.set(None));
    PRESSED_BUTTON.with(|s| s.set(MouseButton::None));

    HIT_GRID.with(|g| g.borrow_mut().resize(80, 24));
}

// =============================================================================
// TESTS
// =============================================================================
