//! Race combinator: first successful resolution wins.
//!
//! All competitors run concurrently; the raced cell resolves with the first
//! **successful** outcome in arrival order. Failures do not win: a
//! competitor failing fast while another succeeds later still yields the
//! later success.
//!
//! # All-fail policy
//!
//! When every competitor fails, the raced cell resolves with a
//! deterministic aggregate: an exhaustion cause naming the competitor
//! count, wrapping the cause of the **first input in argument order** (not
//! completion order, so the result is stable under scheduling).
//!
//! Losers are not cancelled; like the join combinators, abandonment is the
//! caller's decision.

use crate::deferred::Deferred;
use crate::tracing_compat::debug;
use crate::types::{Cause, Outcome};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Races a set of cells; the first success in arrival order wins.
///
/// An empty input resolves immediately with an exhaustion failure.
pub fn race<T>(inputs: &[Deferred<T>]) -> Deferred<T>
where
    T: Clone + Send + 'static,
{
    let result = Deferred::pending();
    let competitors = inputs.len();
    if competitors == 0 {
        result.fail(Cause::exhausted("race of zero competitors"));
        return result;
    }

    let causes: Arc<Mutex<Vec<Option<Cause>>>> = Arc::new(Mutex::new(vec![None; competitors]));
    let failed = Arc::new(AtomicUsize::new(0));

    for (index, input) in inputs.iter().enumerate() {
        let result = result.clone();
        let causes = Arc::clone(&causes);
        let failed = Arc::clone(&failed);
        input.subscribe(move |outcome| match outcome {
            Outcome::Success(value) => {
                result.succeed(value);
            }
            Outcome::Failure(cause) => {
                causes.lock()[index] = Some(cause);
                if failed.fetch_add(1, Ordering::AcqRel) + 1 == competitors {
                    debug!(competitors, "race exhausted: every competitor failed");
                    let first = causes.lock()[0]
                        .take()
                        .expect("every competitor recorded a cause");
                    result.fail(
                        Cause::exhausted(format!("all {competitors} competitors failed"))
                            .with_source(first),
                    );
                }
            }
        });
    }

    result
}

/// Races two cells; see [`race`].
pub fn race2<T>(a: &Deferred<T>, b: &Deferred<T>) -> Deferred<T>
where
    T: Clone + Send + 'static,
{
    race(&[a.clone(), b.clone()])
}
