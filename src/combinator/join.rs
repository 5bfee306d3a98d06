//! Join combinators: fan-in over independently running cells.
//!
//! All inputs run concurrently; the joined cell resolves once every input
//! has resolved. Success carries the values in **argument order** (never
//! completion order); on any failure the joined cell resolves with the
//! cause of whichever input failed **first in time**, which the write-once
//! cell decides for free.
//!
//! # Sibling policy
//!
//! A failure does not cancel the still-pending siblings: they run to their
//! own resolution and their outcomes are discarded. Callers that want early
//! abandonment hold the input handles and `cancel()` them on failure
//! themselves.

use crate::deferred::Deferred;
use crate::types::Outcome;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Joins two cells into a cell of their value pair, argument order.
pub fn join2<A, B>(a: &Deferred<A>, b: &Deferred<B>) -> Deferred<(A, B)>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
{
    let result = Deferred::pending();
    let slots = Arc::new(Mutex::new((None::<A>, None::<B>)));

    {
        let result = result.clone();
        let slots = Arc::clone(&slots);
        a.subscribe(move |outcome| match outcome {
            Outcome::Success(value) => {
                let mut slots = slots.lock();
                slots.0 = Some(value);
                if slots.1.is_some() {
                    let first = take_slot(&mut slots.0);
                    let second = take_slot(&mut slots.1);
                    drop(slots);
                    result.succeed((first, second));
                }
            }
            Outcome::Failure(cause) => {
                result.fail(cause);
            }
        });
    }
    {
        let result = result.clone();
        let slots = Arc::clone(&slots);
        b.subscribe(move |outcome| match outcome {
            Outcome::Success(value) => {
                let mut slots = slots.lock();
                slots.1 = Some(value);
                if slots.0.is_some() {
                    let first = take_slot(&mut slots.0);
                    let second = take_slot(&mut slots.1);
                    drop(slots);
                    result.succeed((first, second));
                }
            }
            Outcome::Failure(cause) => {
                result.fail(cause);
            }
        });
    }

    result
}

/// Joins three cells into a cell of their value triple, argument order.
pub fn join3<A, B, C>(a: &Deferred<A>, b: &Deferred<B>, c: &Deferred<C>) -> Deferred<(A, B, C)>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Clone + Send + 'static,
{
    let ab = join2(a, b);
    join2(&ab, c).map(|((a, b), c)| (a, b, c))
}

/// Joins four cells into a cell of their value quadruple, argument order.
pub fn join4<A, B, C, D>(
    a: &Deferred<A>,
    b: &Deferred<B>,
    c: &Deferred<C>,
    d: &Deferred<D>,
) -> Deferred<(A, B, C, D)>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Clone + Send + 'static,
    D: Clone + Send + 'static,
{
    let abc = join3(a, b, c);
    join2(&abc, d).map(|((a, b, c), d)| (a, b, c, d))
}

/// Joins a homogeneous set of cells into a cell of their values, input
/// order. An empty input succeeds immediately with an empty vec.
pub fn join_all<T>(inputs: &[Deferred<T>]) -> Deferred<Vec<T>>
where
    T: Clone + Send + 'static,
{
    let result = Deferred::pending();
    if inputs.is_empty() {
        result.succeed(Vec::new());
        return result;
    }

    let remaining = Arc::new(AtomicUsize::new(inputs.len()));
    let slots: Arc<Mutex<Vec<Option<T>>>> = Arc::new(Mutex::new(vec![None; inputs.len()]));

    for (index, input) in inputs.iter().enumerate() {
        let result = result.clone();
        let remaining = Arc::clone(&remaining);
        let slots = Arc::clone(&slots);
        input.subscribe(move |outcome| match outcome {
            Outcome::Success(value) => {
                slots.lock()[index] = Some(value);
                if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                    let values = slots.lock().iter_mut().map(take_slot).collect();
                    result.succeed(values);
                }
            }
            Outcome::Failure(cause) => {
                result.fail(cause);
            }
        });
    }

    result
}

fn take_slot<T>(slot: &mut Option<T>) -> T {
    slot.take().expect("join slot filled before completion")
}
