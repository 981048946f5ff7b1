//! Scheduler - the post-render job queue.
//!
//! Work queued with `next_tick` runs on the next `flush()`. The host calls
//! `flush()` once per frame after rendering; tests call it directly.
//!
//! Jobs may queue more jobs. `flush()` keeps draining until the queue is
//! empty, bounded by `MAX_FLUSH_JOBS` to break runaway loops.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use tracing::{trace, warn};

/// Upper bound on jobs run by a single flush.
pub const MAX_FLUSH_JOBS: usize = 10_000;

thread_local! {
    static QUEUE: RefCell<VecDeque<Box<dyn FnOnce()>>> = RefCell::new(VecDeque::new());

    static FLUSHING: Cell<bool> = const { Cell::new(false) };
}

/// Queue a job for the next flush.
pub fn next_tick(job: impl FnOnce() + 'static) {
    QUEUE.with(|q| q.borrow_mut().push_back(Box::new(job)));
}

/// Number of queued jobs.
pub fn pending() -> usize {
    QUEUE.with(|q| q.borrow().len())
}

/// Run queued jobs until the queue is empty. Returns how many ran.
///
/// A nested call from inside a job returns 0; the outer flush picks up
/// anything the job queued.
pub fn flush() -> usize {
    if FLUSHING.with(|f| f.replace(true)) {
        return 0;
    }

    let mut ran = 0;
    loop {
        let job = QUEUE.with(|q| q.borrow_mut().pop_front());
        let Some(job) = job else { break };
        job();
        ran += 1;
        if ran >= MAX_FLUSH_JOBS {
            warn!(ran, left = pending(), "flush stopped: job limit reached");
            break;
        }
    }

    FLUSHING.with(|f| f.set(false));
    if ran > 0 {
        trace!(ran, "flushed post-render queue");
    }
    ran
}

/// Drop all queued jobs (for testing).
pub fn reset_scheduler() {
    QUEUE.with(|q| q.borrow_mut().clear());
    FLUSHING.with(|f| f.set(false));
}
