//! Trampolined continuation dispatch.
//!
//! Continuation delivery goes through an explicit per-thread FIFO queue: the
//! outermost [`dispatch`] call drains the queue, and nested calls (a
//! continuation resolving another cell, which schedules further
//! continuations) only enqueue. Chain depth therefore never shows up on the
//! call stack, which keeps unbounded `map`/`and_then` pipelines at constant
//! stack depth.

use std::cell::RefCell;
use std::collections::VecDeque;

/// A unit of continuation work.
pub(crate) type Job = Box<dyn FnOnce()>;

thread_local! {
    // `Some` while a drain is in progress on this thread.
    static QUEUE: RefCell<Option<VecDeque<Job>>> = const { RefCell::new(None) };
}

/// Enqueues `job` and, if no drain is running on this thread, drains the
/// queue until empty.
///
/// Jobs run in enqueue order. A job that enqueues further jobs sees them run
/// after every job already queued, in FIFO order.
pub(crate) fn dispatch(job: Job) {
    let nested = QUEUE.with(|slot| {
        let mut slot = slot.borrow_mut();
        if let Some(queue) = slot.as_mut() {
            queue.push_back(job);
            true
        } else {
            let mut queue = VecDeque::new();
            queue.push_back(job);
            *slot = Some(queue);
            false
        }
    });
    if nested {
        return;
    }

    // This call owns the drain. Jobs run outside the borrow so they can
    // enqueue freely.
    loop {
        let next = QUEUE.with(|slot| slot.borrow_mut().as_mut().and_then(VecDeque::pop_front));
        match next {
            Some(job) => job(),
            None => break,
        }
    }
    QUEUE.with(|slot| {
        *slot.borrow_mut() = None;
    });
}
