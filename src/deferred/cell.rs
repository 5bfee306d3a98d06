//! The single-resolution cell.
//!
//! [`Deferred`] is a cheaply cloneable handle to a write-once cell holding an
//! eventual [`Outcome`]. The cell has exactly three pieces of shared mutable
//! state (the resolution slot, the continuation queue, and the condvar for
//! blocking waiters), all guarded by one lock, with an atomic fast path for
//! the already-resolved check.
//!
//! # Resolution protocol
//!
//! The state machine is `Pending -> Resolved(Outcome<T>)`, terminal once
//! resolved. Any number of threads may attempt [`resolve`](Deferred::resolve)
//! (or `succeed`/`fail`/`cancel`) concurrently; exactly one wins and the
//! losers return `false` without blocking or panicking. Lost resolution races
//! are expected traffic, not errors: timeout-vs-completion and retry-vs-cancel
//! both produce them.
//!
//! # Continuation delivery
//!
//! Continuations registered while Pending are queued in registration order
//! and run exactly once, in that order, when the cell resolves. A
//! continuation registered after resolution replays immediately with the
//! stored outcome. Delivery runs inline on the resolving (or, for replay,
//! subscribing) thread through the dispatch trampoline, so arbitrarily long
//! `and_then` chains do not grow the stack.

use super::dispatch;
use crate::tracing_compat::{debug, trace};
use crate::types::{Cause, Outcome};
use parking_lot::{Condvar, Mutex};
use smallvec::SmallVec;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

type Continuation<T> = Box<dyn FnOnce(Outcome<T>) + Send>;

enum State<T> {
    Pending {
        continuations: SmallVec<[Continuation<T>; 2]>,
    },
    Resolved(Outcome<T>),
}

struct Cell<T> {
    state: Mutex<State<T>>,
    // Set (Release) after the slot is written, still under the state lock;
    // an Acquire load observing `true` implies the slot is readable.
    resolved: AtomicBool,
    cond: Condvar,
}

/// A thread-safe, write-once container for an eventual [`Outcome`].
///
/// Handles are cheap to clone and share; producers resolve the cell exactly
/// once from any thread, consumers register continuations or block at
/// process boundaries.
///
/// Values must be `Clone` because a resolution fans out to every registered
/// continuation and every blocked waiter; wrap expensive payloads in
/// [`Arc`].
///
/// # Example
///
/// ```
/// use settled::Deferred;
///
/// let deferred = Deferred::pending();
/// let producer = deferred.clone();
/// std::thread::spawn(move || {
///     producer.succeed(42);
/// });
/// assert_eq!(deferred.wait().unwrap(), 42);
/// ```
pub struct Deferred<T> {
    cell: Arc<Cell<T>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: Clone + Send + 'static> Deferred<T> {
    /// Creates a cell in the Pending state.
    #[must_use]
    pub fn pending() -> Self {
        Self {
            cell: Arc::new(Cell {
                state: Mutex::new(State::Pending {
                    continuations: SmallVec::new(),
                }),
                resolved: AtomicBool::new(false),
                cond: Condvar::new(),
            }),
        }
    }

    /// Creates a cell already resolved with the given outcome.
    #[must_use]
    pub fn from_outcome(outcome: Outcome<T>) -> Self {
        Self {
            cell: Arc::new(Cell {
                state: Mutex::new(State::Resolved(outcome)),
                resolved: AtomicBool::new(true),
                cond: Condvar::new(),
            }),
        }
    }

    /// Creates a cell already resolved with a success.
    #[must_use]
    pub fn succeeded(value: T) -> Self {
        Self::from_outcome(Outcome::Success(value))
    }

    /// Creates a cell already resolved with a failure.
    #[must_use]
    pub fn failed(cause: Cause) -> Self {
        Self::from_outcome(Outcome::Failure(cause))
    }

    /// Attempts the `Pending -> Resolved` transition.
    ///
    /// Returns `true` if this call won the transition; `false` if the cell
    /// was already resolved. Losing is normal: callers racing a timeout
    /// against completion both resolve, and exactly one takes effect.
    pub fn resolve(&self, outcome: Outcome<T>) -> bool {
        if self.cell.resolved.load(Ordering::Acquire) {
            trace!("resolution lost: cell already resolved");
            return false;
        }
        let continuations = {
            let mut state = self.cell.state.lock();
            match &mut *state {
                State::Resolved(_) => {
                    trace!("resolution lost: cell already resolved");
                    return false;
                }
                State::Pending { continuations } => {
                    let taken = mem::take(continuations);
                    *state = State::Resolved(outcome.clone());
                    self.cell.resolved.store(true, Ordering::Release);
                    self.cell.cond.notify_all();
                    taken
                }
            }
        };
        debug!(
            continuations = continuations.len(),
            success = outcome.is_success(),
            "deferred resolved"
        );
        for continuation in continuations {
            let delivered = outcome.clone();
            dispatch::dispatch(Box::new(move || continuation(delivered)));
        }
        true
    }

    /// Resolves with a success. See [`resolve`](Self::resolve).
    pub fn succeed(&self, value: T) -> bool {
        self.resolve(Outcome::Success(value))
    }

    /// Resolves with a failure. See [`resolve`](Self::resolve).
    pub fn fail(&self, cause: Cause) -> bool {
        self.resolve(Outcome::Failure(cause))
    }

    /// Cancels the cell: resolves it with a cancellation failure iff still
    /// Pending. A no-op (returning `false`) once resolved.
    ///
    /// Cancellation does not propagate: each derived cell has its own flag,
    /// and cancelling a derived cell leaves its sources running.
    pub fn cancel(&self) -> bool {
        self.fail(Cause::cancelled())
    }

    /// Returns true once the cell is resolved. Lock-free.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.cell.resolved.load(Ordering::Acquire)
    }

    /// Returns true if the cell resolved with a cancellation failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        let state = self.cell.state.lock();
        matches!(&*state, State::Resolved(Outcome::Failure(c)) if c.is_cancelled())
    }

    /// Returns the stored outcome if resolved, without blocking.
    #[must_use]
    pub fn try_outcome(&self) -> Option<Outcome<T>> {
        if !self.is_resolved() {
            return None;
        }
        let state = self.cell.state.lock();
        match &*state {
            State::Resolved(outcome) => Some(outcome.clone()),
            State::Pending { .. } => None,
        }
    }

    /// Registers a continuation, invoked exactly once with the resolved
    /// outcome.
    ///
    /// While Pending the continuation is appended to the queue under the
    /// same lock that guards resolution, so a registration racing a
    /// resolution is either queued (and run by the resolver) or replayed
    /// here, never both and never neither. Continuations run in registration
    /// order.
    pub fn subscribe<F>(&self, continuation: F)
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        let replay = {
            let mut state = self.cell.state.lock();
            match &mut *state {
                State::Pending { continuations } => {
                    continuations.push(Box::new(continuation));
                    None
                }
                State::Resolved(outcome) => {
                    Some((Box::new(continuation) as Continuation<T>, outcome.clone()))
                }
            }
        };
        if let Some((continuation, outcome)) = replay {
            trace!("continuation replayed against stored outcome");
            dispatch::dispatch(Box::new(move || continuation(outcome)));
        }
    }

    /// Blocks the calling thread until the cell resolves.
    ///
    /// This is the process-boundary escape hatch (tests, CLI entry points);
    /// none of this crate's combinators call it.
    #[must_use]
    pub fn wait(&self) -> Outcome<T> {
        let mut state = self.cell.state.lock();
        loop {
            if let State::Resolved(outcome) = &*state {
                return outcome.clone();
            }
            self.cell.cond.wait(&mut state);
        }
    }

    /// Blocks until the cell resolves or `timeout` elapses.
    ///
    /// Returns `None` on timeout; the cell itself is unaffected.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Outcome<T>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.cell.state.lock();
        loop {
            if let State::Resolved(outcome) = &*state {
                return Some(outcome.clone());
            }
            if self.cell.cond.wait_until(&mut state, deadline).timed_out() {
                if let State::Resolved(outcome) = &*state {
                    return Some(outcome.clone());
                }
                return None;
            }
        }
    }

    /// Returns a cell that resolves with `f` applied to this cell's success
    /// value; a failure passes through unchanged.
    pub fn map<U, F>(&self, f: F) -> Deferred<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let result = Deferred::pending();
        let handle = result.clone();
        self.subscribe(move |outcome| {
            handle.resolve(outcome.map(f));
        });
        result
    }

    /// Returns a cell that tracks the cell produced by `f` from this cell's
    /// success value; a failure short-circuits and `f` is never invoked.
    ///
    /// Chains of any length are safe: continuation delivery is trampolined,
    /// so resolution of a long pipeline never recurses.
    pub fn and_then<U, F>(&self, f: F) -> Deferred<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Deferred<U> + Send + 'static,
    {
        let result = Deferred::pending();
        let handle = result.clone();
        self.subscribe(move |outcome| match outcome {
            Outcome::Success(value) => {
                let inner = f(value);
                inner.subscribe(move |inner_outcome| {
                    handle.resolve(inner_outcome);
                });
            }
            Outcome::Failure(cause) => {
                handle.fail(cause);
            }
        });
        result
    }
}

impl<T> core::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.cell.state.lock();
        match &*state {
            State::Pending { continuations } => f
                .debug_struct("Deferred")
                .field("state", &"pending")
                .field("continuations", &continuations.len())
                .finish(),
            State::Resolved(outcome) => f
                .debug_struct("Deferred")
                .field("state", &"resolved")
                .field("success", &outcome.is_success())
                .finish(),
        }
    }
}
