//! Settled: write-once outcomes and deferred resolution for concurrent Rust.
//!
//! # Overview
//!
//! Settled provides two complementary containers. [`Outcome`] is the
//! synchronous one: an immutable success/failure union with a
//! transformation algebra and no concurrency concerns. [`Deferred`] is the
//! asynchronous one: a thread-safe, single-resolution cell wrapping an
//! eventual `Outcome`, with a continuation queue and combinators for
//! composition (map, and_then, join, race, delay, timeout, retry, poll).
//!
//! # Core Guarantees
//!
//! - **At-most-once resolution**: any number of threads may race to resolve
//!   a cell; exactly one wins, losers return normally
//! - **Exactly-once delivery**: every continuation runs once against the
//!   recorded outcome, in registration order, even when registration races
//!   resolution
//! - **Deterministic ordering**: joins preserve argument order regardless
//!   of completion order; races are strictly first-success-wins
//! - **Constant stack depth**: continuation delivery is trampolined, so
//!   pipelines of unbounded length never recurse
//! - **No ambient threads**: the core asks its host for a single
//!   `schedule(delay, callback)` primitive and nothing else
//!
//! # Module Structure
//!
//! - [`types`]: core value types ([`Outcome`], [`Cause`])
//! - [`deferred`]: the single-resolution cell and its dispatch engine
//! - [`combinator`]: join, race, timeout, retry, poll
//! - [`time`]: the host timer seam and `delay`
//! - [`blocking`]: bridge from blocking closures into deferred resolution
//! - [`tracing_compat`]: optional tracing integration (requires the
//!   `tracing-integration` feature)
//! - [`util`]: internal utilities (deterministic RNG)
//!
//! # Example
//!
//! ```
//! use settled::{delay, timeout, Deferred, Timer, VirtualTimer};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let lab = Arc::new(VirtualTimer::new());
//! let timer: Arc<dyn Timer> = lab.clone();
//!
//! let work: Deferred<&str> = Deferred::pending();
//! let timed = timeout(&timer, &work, Duration::from_millis(100));
//!
//! work.succeed("finished in time");
//! lab.advance(Duration::from_millis(100));
//! assert_eq!(timed.wait().unwrap(), "finished in time");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_inception)]
#![allow(clippy::doc_markdown)]

pub mod blocking;
pub mod combinator;
pub mod deferred;
pub mod time;
pub mod tracing_compat;
pub mod types;
pub mod util;

// Re-exports for convenient access to core types
pub use blocking::{Job, ThreadWorker, Worker, lift_blocking};
pub use combinator::{
    AlwaysRetry, NeverRetry, PollPolicy, PollStatus, RetryIf, RetryPolicy, RetryPredicate,
    backoff_delay, join2, join3, join4, join_all, poll, race, race2, retry, timeout,
};
pub use deferred::{Deferred, DeferredFuture};
pub use time::{ThreadTimer, Timer, TimerCallback, VirtualTimer, delay};
pub use types::{Cause, CauseKind, Outcome, collect, combine2, combine3, combine4};
pub use util::DetRng;
