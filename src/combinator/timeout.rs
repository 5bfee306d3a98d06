//! Timeout combinator: race a cell against a deadline.
//!
//! The timed cell resolves with the source's outcome when it arrives in
//! time, and with a timeout failure when the deadline fires first. The
//! underlying computation is never stopped or cancelled; only the
//! externally observed result changes. Whichever side loses the resolution
//! race is a no-op.

use crate::deferred::Deferred;
use crate::time::Timer;
use crate::tracing_compat::debug;
use crate::types::Cause;
use std::sync::Arc;
use std::time::Duration;

/// Returns a cell racing `source` against a `duration` deadline on `timer`.
///
/// # Example
///
/// ```
/// use settled::{timeout, CauseKind, Deferred, Timer, VirtualTimer};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let lab = Arc::new(VirtualTimer::new());
/// let timer: Arc<dyn Timer> = lab.clone();
///
/// let slow: Deferred<i32> = Deferred::pending();
/// let timed = timeout(&timer, &slow, Duration::from_millis(100));
///
/// lab.advance(Duration::from_millis(100));
/// assert_eq!(timed.try_outcome().unwrap().cause().map(|c| c.kind()),
///            Some(CauseKind::Timeout));
/// // The source is untouched and may still resolve for other observers.
/// assert!(!slow.is_resolved());
/// ```
pub fn timeout<T>(timer: &Arc<dyn Timer>, source: &Deferred<T>, duration: Duration) -> Deferred<T>
where
    T: Clone + Send + 'static,
{
    let result = Deferred::pending();

    {
        let result = result.clone();
        source.subscribe(move |outcome| {
            result.resolve(outcome);
        });
    }

    let deadline = result.clone();
    timer.schedule(
        duration,
        Box::new(move || {
            if deadline.fail(Cause::timeout(format!("deadline of {duration:?} elapsed"))) {
                debug!(?duration, "timeout fired before completion");
            }
        }),
    );

    result
}
