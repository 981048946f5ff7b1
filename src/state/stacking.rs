//! Stacking - the global z-index counter.
//!
//! Popups without an explicit z-index take the next value on first show.
//! Each allocation reserves two slots so the overlay (popup z - 1) never ties
//! with an earlier popup.

use std::cell::Cell;

/// First z-index handed out is `BASE_Z_INDEX + 2`.
pub const BASE_Z_INDEX: i32 = 2000;

const STEP: i32 = 2;

thread_local! {
    static Z_COUNTER: Cell<i32> = const { Cell::new(BASE_Z_INDEX) };
}

/// Reserve and return the next z-index.
pub fn next_z_index() -> i32 {
    Z_COUNTER.with(|c| {
        let next = c.get().saturating_add(STEP);
        c.set(next);
        next
    })
}

/// Last value handed out (or the base, if none yet).
pub fn current_z_index() -> i32 {
    Z_COUNTER.with(|c| c.get())
}

/// Reset the counter (for testing).
pub fn reset_z_index() {
    Z_COUNTER.with(|c| c.set(BASE_Z_INDEX));
}
