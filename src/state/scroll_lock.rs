//! Scroll Lock - Reference-counted lock over the document body.
//!
//! Every visible popup that asks for it holds one slot. The body is locked
//! while at least one slot is held and unlocked when the last one goes:
//!
//! ```text
//! acquire()  0 -> 1   lock body (class + signal)
//! acquire()  1 -> 2   count only
//! release()  2 -> 1   count only
//! release()  1 -> 0   unlock body
//! release()  0        warn, stay at 0
//! ```
//!
//! While locked, `mouse::dispatch` asks `blocks()` whether a scroll or drag
//! gesture should be swallowed.

use std::cell::Cell;

use bitflags::bitflags;
use spark_signals::{signal, Signal};
use tracing::{debug, warn};

use super::mouse::{MouseAction, MouseEvent};
use crate::engine::arrays::core;
use crate::engine::{closest, document_body};
use crate::types::NodeKind;

/// Class carried by the document body while locked.
pub const LOCK_CLASS: &str = "spark-overflow-hidden";

bitflags! {
    /// Which background gestures the lock swallows.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LockTargets: u8 {
        /// Mouse wheel / trackpad scroll.
        const WHEEL = 0b01;
        /// Button-held drags (touch-style scrolling).
        const DRAG = 0b10;
    }
}

impl Default for LockTargets {
    fn default() -> Self {
        LockTargets::all()
    }
}

thread_local! {
    static LOCK_COUNT: Cell<usize> = const { Cell::new(0) };

    static LOCKED: Signal<bool> = signal(false);

    static LOCK_TARGETS: Cell<LockTargets> = Cell::new(LockTargets::default());
}

// =============================================================================
// Acquire / Release
// =============================================================================

/// Take one lock slot.
pub fn acquire() {
    let count = LOCK_COUNT.with(|c| {
        let next = c.get() + 1;
        c.set(next);
        next
    });

    if count == 1 {
        let body = document_body();
        core::add_class(body, LOCK_CLASS);
        LOCKED.with(|s| s.set(true));
        debug!(body, "scroll lock engaged");
    }
}

/// Give back one lock slot. Releasing with no holders is a no-op.
pub fn release() {
    let count = LOCK_COUNT.with(|c| c.get());
    if count == 0 {
        warn!("scroll lock released with no holders");
        return;
    }

    LOCK_COUNT.with(|c| c.set(count - 1));

    if count == 1 {
        let body = document_body();
        core::remove_class(body, LOCK_CLASS);
        LOCKED.with(|s| s.set(false));
        debug!(body, "scroll lock released");
    }
}

/// Current number of holders.
pub fn lock_count() -> usize {
    LOCK_COUNT.with(|c| c.get())
}

/// Is the document locked? Reactive: reading inside an effect tracks it.
pub fn is_locked() -> bool {
    LOCKED.with(|s| s.get())
}

// =============================================================================
// Gesture Blocking
// =============================================================================

pub fn set_lock_targets(targets: LockTargets) {
    LOCK_TARGETS.with(|t| t.set(targets));
}

pub fn lock_targets() -> LockTargets {
    LOCK_TARGETS.with(|t| t.get())
}

/// Should this gesture be swallowed?
///
/// True while locked for wheel/drag gestures (per `LockTargets`) whose target
/// is not inside a visible popup.
pub fn blocks(event: &MouseEvent) -> bool {
    if lock_count() == 0 {
        return false;
    }

    let required = match event.action {
        MouseAction::Scroll => LockTargets::WHEEL,
        MouseAction::Drag => LockTargets::DRAG,
        _ => return false,
    };
    if !lock_targets().contains(required) {
        return false;
    }

    let inside_popup = event.component_index.is_some_and(|idx| {
        closest(idx, |i| core::get_kind(i) == NodeKind::Popup && core::get_visible(i)).is_some()
    });
    !inside_popup
}

/// Reset lock state (for testing).
///
/// Does not touch the body node; reset the registry alongside.
pub fn reset_scroll_lock() {
    LOCK_COUNT.with(|c| c.set(0));
    LOCKED.with(|s| s.set(false));
    LOCK_TARGETS.with(|t| t.set(LockTargets::default()));
}
