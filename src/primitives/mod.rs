//! Primitives - Component building blocks.
//!
//! - [`box_primitive`] - Plain container (page structure, teleport targets, content)
//! - [`popup`] - Overlay/modal with lazy render, teleport and scroll lock
//!
//! # Architecture
//!
//! Components are indices into parallel arrays. Each component:
//! 1. Allocates an index from the registry
//! 2. Attaches to the current parent context (or the document body)
//! 3. Binds reactive props inside an effect scope
//! 4. Returns a cleanup function (box) or a handle (popup)
//!
//! # Reactivity
//!
//! Props can be static values, signals or getters. Pass the signal itself,
//! not its current value, or the binding is lost:
//!
//! ```ignore
//! // CORRECT - popup follows the signal
//! popup(PopupProps { value: show.clone().into(), ..Default::default() });
//!
//! // WRONG - read once, never updated
//! popup(PopupProps { value: show.get().into(), ..Default::default() });
//! ```

mod types;
mod box_primitive;
pub mod overlay;
pub mod popup;
pub mod teleport;

pub use types::*;
pub use box_primitive::box_primitive;
pub use overlay::{OverlayController, OVERLAY_CLASS};
pub use popup::{popup, Popup, CLOSE_ICON_CLASS, POPUP_CLASS, ROUND_CLASS};
pub use teleport::{resolve_container, try_resolve, Teleport};
