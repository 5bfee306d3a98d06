//! Time primitives: the host timer seam and the `delay` building block.

pub mod driver;

pub use driver::{ThreadTimer, Timer, TimerCallback, VirtualTimer};

use crate::deferred::Deferred;
use std::sync::Arc;
use std::time::Duration;

/// Returns a cell that resolves successfully after `duration` has elapsed
/// on `timer`.
///
/// This is the building block for backoff and polling; it never fails, and
/// cancelling the returned cell does not unregister the underlying timer
/// callback (the late callback loses the resolution race and is a no-op).
///
/// # Example
///
/// ```
/// use settled::{delay, Timer, VirtualTimer};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let timer: Arc<dyn Timer> = Arc::new(VirtualTimer::new());
/// let done = delay(&timer, Duration::from_millis(50));
/// assert!(!done.is_resolved());
/// ```
pub fn delay(timer: &Arc<dyn Timer>, duration: Duration) -> Deferred<()> {
    let deferred = Deferred::pending();
    let handle = deferred.clone();
    timer.schedule(
        duration,
        Box::new(move || {
            handle.succeed(());
        }),
    );
    deferred
}
