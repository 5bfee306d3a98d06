//! Bridge from blocking computations into deferred resolution.
//!
//! The core never runs long blocking work itself; hosts hand a closure to
//! [`lift_blocking`], which runs it on a host-provided [`Worker`] and
//! resolves the returned cell with the closure's result. A panic inside the
//! closure is caught and converted into a failure with a panic cause, so no
//! unwinding crosses the outcome boundary.

use crate::deferred::Deferred;
use crate::tracing_compat::warn;
use crate::types::{Cause, Outcome};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// A unit of blocking work.
pub type Job = Box<dyn FnOnce() + Send>;

/// Host-provided execution of blocking jobs.
///
/// Implementations decide where jobs run: a pool, a dedicated thread, or
/// inline for tests. Jobs must eventually run; a dropped job leaves its
/// cell pending forever.
pub trait Worker: Send + Sync {
    /// Runs `job` to completion, on whatever thread the host chooses.
    fn execute(&self, job: Job);
}

/// Boundary-tier [`Worker`] spawning one thread per job.
///
/// Suitable for low-volume process edges (CLI entry points, tests). Hosts
/// with real throughput needs bring their own pool-backed `Worker`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadWorker;

impl ThreadWorker {
    /// Creates a thread-per-job worker.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Worker for ThreadWorker {
    fn execute(&self, job: Job) {
        std::thread::Builder::new()
            .name("settled-blocking".into())
            .spawn(job)
            .expect("failed to spawn blocking worker thread");
    }
}

/// Runs `f` on `worker` and returns a cell resolving with its result.
///
/// `Ok` becomes a success, `Err` a failure, and a panic is caught and
/// converted into a failure with a panic cause.
///
/// # Example
///
/// ```
/// use settled::{lift_blocking, ThreadWorker};
///
/// let worker = ThreadWorker::new();
/// let deferred = lift_blocking(&worker, || Ok::<_, settled::Cause>(21 * 2));
/// assert_eq!(deferred.wait().unwrap(), 42);
/// ```
pub fn lift_blocking<T, F>(worker: &dyn Worker, f: F) -> Deferred<T>
where
    T: Clone + Send + 'static,
    F: FnOnce() -> Result<T, Cause> + Send + 'static,
{
    let deferred = Deferred::pending();
    let handle = deferred.clone();
    worker.execute(Box::new(move || {
        let outcome = match catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => Outcome::Success(value),
            Ok(Err(cause)) => Outcome::Failure(cause),
            Err(payload) => {
                warn!("blocking job panicked");
                Outcome::Failure(Cause::panic(panic_message(payload.as_ref())))
            }
        };
        handle.resolve(outcome);
    }));
    deferred
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic payload of unknown type".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CauseKind;

    #[test]
    fn ok_result_resolves_success() {
        let deferred = lift_blocking(&ThreadWorker::new(), || Ok::<_, Cause>(42));
        assert_eq!(deferred.wait(), Outcome::success(42));
    }

    #[test]
    fn err_result_resolves_failure() {
        let deferred: Deferred<i32> =
            lift_blocking(&ThreadWorker::new(), || Err(Cause::user("no luck")));
        assert_eq!(
            deferred.wait().cause().map(Cause::message),
            Some("no luck")
        );
    }

    #[test]
    fn panic_is_captured_as_a_panic_cause() {
        let deferred: Deferred<i32> =
            lift_blocking(&ThreadWorker::new(), || panic!("exploded in worker"));
        let outcome = deferred.wait();
        let cause = outcome.cause().unwrap();
        assert_eq!(cause.kind(), CauseKind::Panic);
        assert_eq!(cause.message(), "exploded in worker");
    }

    #[test]
    fn inline_worker_runs_on_the_calling_thread() {
        struct InlineWorker;
        impl Worker for InlineWorker {
            fn execute(&self, job: Job) {
                job();
            }
        }

        let deferred = lift_blocking(&InlineWorker, || Ok::<_, Cause>("inline"));
        assert_eq!(deferred.try_outcome(), Some(Outcome::success("inline")));
    }
}
