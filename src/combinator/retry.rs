//! Retry combinator with exponential backoff.
//!
//! [`retry`] re-invokes a deferred-producing operation until it succeeds,
//! the attempt budget is exhausted, or the predicate declines the failure.
//! The terminal failure propagates unchanged; retry never rewraps causes.
//!
//! Backoff between attempts is exponential with a cap and optional jitter.
//! Jitter is drawn from a seeded [`DetRng`], so a given policy produces the
//! same delay sequence on every run.
//!
//! # Cancellation
//!
//! Cancelling the returned cell stops the loop: no further attempt starts
//! once the result is resolved. The in-flight attempt keeps running (it
//! cannot be force-stopped); its late outcome loses the resolution race.

use crate::deferred::Deferred;
use crate::time::Timer;
use crate::tracing_compat::{debug, trace};
use crate::types::{Cause, Outcome};
use crate::util::det_rng::DetRng;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Policy for retry behavior: attempt budget and backoff shape.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first. At least 1.
    pub max_attempts: u32,
    /// Delay before the first retry (after the first failure).
    pub initial_delay: Duration,
    /// Cap on the exponential growth of delays.
    pub max_delay: Duration,
    /// Backoff multiplier, at least 1.0 (typically 2.0).
    pub multiplier: f64,
    /// Jitter factor in [0.0, 1.0]; 0.1 adds up to 10% to each delay.
    pub jitter: f64,
    /// Seed for the deterministic jitter stream.
    pub jitter_seed: u64,
}

impl RetryPolicy {
    /// Creates a policy with the default settings: 3 attempts, 100ms
    /// initial delay, 30s cap, 2.0 multiplier, no jitter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: 0.0,
            jitter_seed: 1,
        }
    }

    /// Sets the attempt budget (floored at 1).
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets the delay before the first retry.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the delay cap.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier (floored at 1.0).
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self
    }

    /// Sets the jitter factor (clamped to [0.0, 1.0]).
    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Sets the jitter seed.
    #[must_use]
    pub fn with_jitter_seed(mut self, seed: u64) -> Self {
        self.jitter_seed = seed;
        self
    }

    /// Creates a policy with fixed delays and no jitter.
    #[must_use]
    pub fn fixed_delay(delay: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: delay,
            max_delay: delay,
            multiplier: 1.0,
            jitter: 0.0,
            jitter_seed: 1,
        }
    }

    /// Creates a policy that retries immediately, without delays.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self::fixed_delay(Duration::ZERO, max_attempts)
    }

    /// Validates the policy.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1");
        }
        if self.multiplier < 1.0 {
            return Err("multiplier must be at least 1.0");
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err("jitter must be between 0.0 and 1.0");
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the backoff delay after the given failed attempt (1-indexed).
///
/// The delay is `initial_delay * multiplier^(attempt - 1)`, capped at
/// `max_delay`, with up to `jitter` of the capped delay added from `rng`.
#[must_use]
#[allow(
    clippy::cast_possible_wrap,  // exponent bounded by practical attempt counts
    clippy::cast_precision_loss, // millisecond-to-second scale durations
    clippy::cast_sign_loss,      // non-negative after the min() cap
)]
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32, rng: Option<&mut DetRng>) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }
    let exponent = attempt.saturating_sub(1);
    let base_nanos = policy.initial_delay.as_nanos() as f64 * policy.multiplier.powi(exponent as i32);
    let capped_nanos = base_nanos.min(policy.max_delay.as_nanos() as f64);
    let final_nanos = if policy.jitter > 0.0 {
        rng.map_or(capped_nanos, |rng| {
            capped_nanos * (1.0 + rng.next_f64() * policy.jitter)
        })
    } else {
        capped_nanos
    };
    Duration::from_nanos(final_nanos as u64)
}

/// Decides whether a failure is worth retrying.
pub trait RetryPredicate: Send + Sync + 'static {
    /// Returns true if the operation should be retried after `cause`.
    fn should_retry(&self, cause: &Cause) -> bool;
}

/// Retries every failure.
#[derive(Debug, Clone, Copy)]
pub struct AlwaysRetry;

impl RetryPredicate for AlwaysRetry {
    fn should_retry(&self, _cause: &Cause) -> bool {
        true
    }
}

/// Retries nothing; the first failure is terminal.
#[derive(Debug, Clone, Copy)]
pub struct NeverRetry;

impl RetryPredicate for NeverRetry {
    fn should_retry(&self, _cause: &Cause) -> bool {
        false
    }
}

/// Retries based on a closure over the cause.
#[derive(Debug, Clone, Copy)]
pub struct RetryIf<F>(pub F);

impl<F> RetryPredicate for RetryIf<F>
where
    F: Fn(&Cause) -> bool + Send + Sync + 'static,
{
    fn should_retry(&self, cause: &Cause) -> bool {
        (self.0)(cause)
    }
}

struct RetryCtx<T, Op, P> {
    timer: Arc<dyn Timer>,
    op: Mutex<Op>,
    policy: RetryPolicy,
    predicate: P,
    attempt: AtomicU32,
    rng: Mutex<DetRng>,
    result: Deferred<T>,
}

/// Retries `op` under `policy` until success, predicate refusal, or attempt
/// exhaustion.
///
/// `op` is invoked once per attempt and returns the attempt's cell. The
/// terminal failure (predicate refusal or budget exhaustion) propagates to
/// the returned cell unchanged.
pub fn retry<T, Op, P>(
    timer: &Arc<dyn Timer>,
    op: Op,
    policy: RetryPolicy,
    predicate: P,
) -> Deferred<T>
where
    T: Clone + Send + 'static,
    Op: FnMut() -> Deferred<T> + Send + 'static,
    P: RetryPredicate,
{
    let result = Deferred::pending();
    if let Err(message) = policy.validate() {
        result.fail(Cause::user(format!("invalid retry policy: {message}")));
        return result;
    }
    let rng = DetRng::new(policy.jitter_seed);
    let ctx = Arc::new(RetryCtx {
        timer: Arc::clone(timer),
        op: Mutex::new(op),
        policy,
        predicate,
        attempt: AtomicU32::new(0),
        rng: Mutex::new(rng),
        result: result.clone(),
    });
    run_attempt(ctx);
    result
}

fn run_attempt<T, Op, P>(ctx: Arc<RetryCtx<T, Op, P>>)
where
    T: Clone + Send + 'static,
    Op: FnMut() -> Deferred<T> + Send + 'static,
    P: RetryPredicate,
{
    if ctx.result.is_resolved() {
        trace!("retry loop stopped: result already resolved");
        return;
    }
    let attempt = ctx.attempt.fetch_add(1, Ordering::SeqCst) + 1;
    trace!(attempt, "retry attempt started");
    let deferred = {
        let mut op = ctx.op.lock();
        (*op)()
    };
    let ctx = Arc::clone(&ctx);
    deferred.subscribe(move |outcome| match outcome {
        Outcome::Success(value) => {
            ctx.result.succeed(value);
        }
        Outcome::Failure(cause) => {
            if attempt >= ctx.policy.max_attempts || !ctx.predicate.should_retry(&cause) {
                ctx.result.fail(cause);
                return;
            }
            let backoff = backoff_delay(&ctx.policy, attempt, Some(&mut ctx.rng.lock()));
            debug!(attempt, ?backoff, "retrying after backoff");
            let next = Arc::clone(&ctx);
            ctx.timer
                .schedule(backoff, Box::new(move || run_attempt(next)));
        }
    });
}
