//! Poll combinator: repeated status checks until completion.
//!
//! [`poll`] drives an operation that reports progress through
//! [`PollStatus`]: each round invokes the check, and a `StillRunning` status
//! schedules the next round after the policy interval. The loop stops on
//! `Completed`, on `Failed`, or when the attempt budget is exhausted, which
//! resolves as a timeout failure.

use crate::deferred::Deferred;
use crate::time::Timer;
use crate::tracing_compat::trace;
use crate::types::{Cause, Outcome};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// The status reported by one poll round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus<T> {
    /// The operation finished with a value; polling stops.
    Completed(T),
    /// The operation finished with a failure; polling stops.
    Failed(Cause),
    /// The operation is still in progress; poll again after the interval.
    StillRunning,
}

/// Policy for a polling loop: round spacing and attempt budget.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Delay between consecutive rounds.
    pub interval: Duration,
    /// Maximum number of rounds, including the first. At least 1.
    pub max_attempts: u32,
}

impl PollPolicy {
    /// Creates a policy with the given interval and attempt budget.
    #[must_use]
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Validates the policy.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1");
        }
        Ok(())
    }
}

struct PollCtx<T, Check> {
    timer: Arc<dyn Timer>,
    check: Mutex<Check>,
    policy: PollPolicy,
    round: AtomicU32,
    result: Deferred<T>,
}

/// Polls `check` under `policy` until it reports completion or failure.
///
/// `check` is invoked once per round and returns a cell carrying that
/// round's [`PollStatus`]. A failure of the check cell itself stops the
/// loop with that cause. Attempt exhaustion resolves a timeout failure.
pub fn poll<T, Check>(timer: &Arc<dyn Timer>, check: Check, policy: PollPolicy) -> Deferred<T>
where
    T: Clone + Send + 'static,
    Check: FnMut() -> Deferred<PollStatus<T>> + Send + 'static,
{
    let result = Deferred::pending();
    if let Err(message) = policy.validate() {
        result.fail(Cause::user(format!("invalid poll policy: {message}")));
        return result;
    }
    let ctx = Arc::new(PollCtx {
        timer: Arc::clone(timer),
        check: Mutex::new(check),
        policy,
        round: AtomicU32::new(0),
        result: result.clone(),
    });
    run_round(ctx);
    result
}

fn run_round<T, Check>(ctx: Arc<PollCtx<T, Check>>)
where
    T: Clone + Send + 'static,
    Check: FnMut() -> Deferred<PollStatus<T>> + Send + 'static,
{
    if ctx.result.is_resolved() {
        trace!("poll loop stopped: result already resolved");
        return;
    }
    let round = ctx.round.fetch_add(1, Ordering::SeqCst) + 1;
    trace!(round, "poll round started");
    let status = {
        let mut check = ctx.check.lock();
        (*check)()
    };
    let ctx = Arc::clone(&ctx);
    status.subscribe(move |outcome| match outcome {
        Outcome::Success(PollStatus::Completed(value)) => {
            ctx.result.succeed(value);
        }
        Outcome::Success(PollStatus::Failed(cause)) | Outcome::Failure(cause) => {
            ctx.result.fail(cause);
        }
        Outcome::Success(PollStatus::StillRunning) => {
            if round >= ctx.policy.max_attempts {
                ctx.result.fail(Cause::timeout(format!(
                    "poll gave up after {round} attempts"
                )));
                return;
            }
            let next = Arc::clone(&ctx);
            ctx.timer
                .schedule(ctx.policy.interval, Box::new(move || run_round(next)));
        }
    });
}
