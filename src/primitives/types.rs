//! Primitive types - Props, events and cleanup.
//!
//! These types define the interface for component props.
//! Props support static values, signals, and getters for reactivity.

use std::fmt;
use std::rc::Rc;

use spark_signals::Signal;

use super::teleport::Teleport;
use crate::state::gesture::GestureClassifier;
use crate::state::mouse::MouseEvent;
use crate::state::transition::Transition;
use crate::types::Position;

// =============================================================================
// Cleanup Function
// =============================================================================

/// Cleanup function returned by components.
///
/// Call this to unmount the component and release resources.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Callback Types
// =============================================================================

/// Mouse event callback type (Rc for shared ownership in closures).
pub type MouseCallback = Rc<dyn Fn(&MouseEvent)>;

/// Plain event callback.
pub type EventCallback = Rc<dyn Fn()>;

/// Two-way binding callback, receives the new value.
pub type UpdateCallback = Rc<dyn Fn(bool)>;

/// Observer for every popup event.
pub type PopupListener = Rc<dyn Fn(&PopupEvent)>;

// =============================================================================
// Prop Value - Reactive property wrapper
// =============================================================================

/// A property value that can be static, a signal, or a getter.
///
/// Signals and getters are read inside effects, so the owning component
/// reacts when they change.
#[derive(Clone)]
pub enum PropValue<T: Clone + PartialEq + 'static> {
    /// Static value (not reactive).
    Static(T),
    /// Reactive signal (changes propagate automatically).
    Signal(Signal<T>),
    /// Getter function (called each time value is needed).
    Getter(Rc<dyn Fn() -> T>),
}

impl<T: Clone + PartialEq + 'static> PropValue<T> {
    /// Get the current value (for immediate reads).
    pub fn get(&self) -> T {
        match self {
            PropValue::Static(v) => v.clone(),
            PropValue::Signal(s) => s.get(),
            PropValue::Getter(f) => f(),
        }
    }

    /// Does reading this value inside an effect track anything?
    pub fn is_reactive(&self) -> bool {
        !matches!(self, PropValue::Static(_))
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for PropValue<T> {
    fn default() -> Self {
        PropValue::Static(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> From<T> for PropValue<T> {
    fn from(value: T) -> Self {
        PropValue::Static(value)
    }
}

impl<T: Clone + PartialEq + 'static> From<Signal<T>> for PropValue<T> {
    fn from(signal: Signal<T>) -> Self {
        PropValue::Signal(signal)
    }
}

// =============================================================================
// Box Props
// =============================================================================

/// Properties for the Box component.
///
/// Box is the plain container: page structure, teleport targets, popup
/// content.
#[derive(Default)]
pub struct BoxProps {
    /// Node ID (for `#id` selectors).
    pub id: Option<String>,
    /// Space-separated class list (for `.class` selectors).
    pub class: Option<String>,
    /// Hidden boxes stay in the tree.
    pub visible: Option<PropValue<bool>>,
    /// Child components, created with this box as parent context.
    pub children: Option<Box<dyn FnOnce()>>,
    pub on_click: Option<MouseCallback>,
}

// =============================================================================
// Popup Events
// =============================================================================

/// Everything a popup reports to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupEvent {
    /// Showing started.
    Open,
    /// Hiding started (after the overlay is hidden and the lock released).
    Close,
    /// Enter transition finished.
    Opened,
    /// Leave transition finished.
    Closed,
    /// Tap on the popup surface.
    Click,
    /// Tap (not drag) on the overlay.
    ClickOverlay,
    /// Tap on the close icon.
    ClickCloseIcon,
    /// Two-way binding update carrying the new visibility.
    UpdateValue(bool),
}

impl PopupEvent {
    /// Event name as listeners know it.
    pub fn name(&self) -> &'static str {
        match self {
            PopupEvent::Open => "open",
            PopupEvent::Close => "close",
            PopupEvent::Opened => "opened",
            PopupEvent::Closed => "closed",
            PopupEvent::Click => "click",
            PopupEvent::ClickOverlay => "click-overlay",
            PopupEvent::ClickCloseIcon => "click-close-icon",
            PopupEvent::UpdateValue(_) => "update:value",
        }
    }
}

impl fmt::Display for PopupEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PopupEvent::UpdateValue(v) => write!(f, "{}({})", self.name(), v),
            _ => f.write_str(self.name()),
        }
    }
}

// =============================================================================
// Popup Props
// =============================================================================

/// Properties for the Popup component.
///
/// # Example
///
/// ```ignore
/// use spark_popup::primitives::{popup, PopupProps, Teleport};
/// use spark_signals::signal;
///
/// let show = signal(false);
/// let sheet = popup(PopupProps {
///     position: Position::Bottom,
///     teleport: Teleport::Selector("body".into()),
///     closeable: true,
///     ..PopupProps::model(show.clone())
/// });
///
/// show.set(true); // opens
/// ```
pub struct PopupProps {
    /// ID for the root node.
    pub id: Option<String>,
    /// Extra classes for the root node.
    pub class: Option<String>,

    // =========================================================================
    // State
    // =========================================================================
    /// Visibility. A signal or getter is watched.
    pub value: PropValue<bool>,
    /// Show a dimming overlay behind the popup.
    pub overlay: PropValue<bool>,
    /// Hold a scroll-lock slot while visible.
    pub lock_scroll: PropValue<bool>,
    /// Where the root node lives.
    pub teleport: Teleport,

    // =========================================================================
    // Presentation
    // =========================================================================
    /// Explicit z-index. Unset takes the next global value on first show.
    pub z_index: Option<i32>,
    /// Transition duration in seconds.
    pub duration: Option<f32>,
    pub position: Position,
    pub round: bool,
    pub closeable: bool,
    pub close_icon: String,
    pub close_on_click_overlay: bool,

    // =========================================================================
    // Collaborators
    // =========================================================================
    /// Enter/leave timing. Defaults to `InstantTransition`.
    pub transition: Option<Rc<dyn Transition>>,
    /// Tap vs drag on the overlay. Defaults to `DistanceClassifier`.
    pub gesture: Option<Rc<dyn GestureClassifier>>,

    /// Content, rendered lazily on first show.
    pub children: Option<Box<dyn FnOnce()>>,

    // =========================================================================
    // Events
    // =========================================================================
    pub on_open: Option<EventCallback>,
    pub on_close: Option<EventCallback>,
    pub on_opened: Option<EventCallback>,
    pub on_closed: Option<EventCallback>,
    pub on_click: Option<EventCallback>,
    pub on_click_overlay: Option<EventCallback>,
    pub on_click_close_icon: Option<EventCallback>,
    /// Visibility changed from inside the popup (or through `set_visible`).
    pub on_update_value: Option<UpdateCallback>,
}

impl Default for PopupProps {
    fn default() -> Self {
        Self {
            id: None,
            class: None,
            value: PropValue::Static(false),
            overlay: PropValue::Static(true),
            lock_scroll: PropValue::Static(true),
            teleport: Teleport::None,
            z_index: None,
            duration: None,
            position: Position::Center,
            round: false,
            closeable: false,
            close_icon: "cross".to_string(),
            close_on_click_overlay: true,
            transition: None,
            gesture: None,
            children: None,
            on_open: None,
            on_close: None,
            on_opened: None,
            on_closed: None,
            on_click: None,
            on_click_overlay: None,
            on_click_close_icon: None,
            on_update_value: None,
        }
    }
}

impl PopupProps {
    /// Props with a two-way binding to `value`.
    ///
    /// The popup follows the signal, and closes coming from inside the popup
    /// (overlay tap, close icon) write `false` back into it.
    pub fn model(value: Signal<bool>) -> Self {
        let writer = value.clone();
        Self {
            value: PropValue::Signal(value),
            on_update_value: Some(Rc::new(move |v: bool| {
                writer.set(v);
            })),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_signals::signal;

    #[test]
    fn test_prop_value_reads() {
        let s = signal(3);
        let from_signal: PropValue<i32> = s.clone().into();
        let from_static: PropValue<i32> = 7.into();
        let getter = PropValue::Getter(Rc::new(|| 11));

        assert_eq!(from_signal.get(), 3);
        s.set(4);
        assert_eq!(from_signal.get(), 4);
        assert_eq!(from_static.get(), 7);
        assert_eq!(getter.get(), 11);

        assert!(from_signal.is_reactive());
        assert!(!from_static.is_reactive());
    }

    #[test]
    fn test_popup_props_defaults() {
        let props = PopupProps::default();

        assert!(!props.value.get());
        assert!(props.overlay.get());
        assert!(props.lock_scroll.get());
        assert!(props.close_on_click_overlay);
        assert_eq!(props.close_icon, "cross");
        assert_eq!(props.position, Position::Center);
        assert!(matches!(props.teleport, Teleport::None));
    }

    #[test]
    fn test_model_writes_back() {
        let show = signal(true);
        let props = PopupProps::model(show.clone());

        assert!(props.value.get());
        if let Some(update) = &props.on_update_value {
            update(false);
        }
        assert!(!show.get());
    }

    #[test]
    fn test_event_names() {
        assert_eq!(PopupEvent::ClickOverlay.name(), "click-overlay");
        assert_eq!(PopupEvent::UpdateValue(false).to_string(), "update:value(false)");
        assert_eq!(PopupEvent::Open.to_string(), "open");
    }
}
