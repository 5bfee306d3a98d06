//! Composition algebra over [`Deferred`](crate::Deferred) cells.
//!
//! - [`join`]: fan-in, argument-order results, first-in-time failure
//! - [`race`]: first successful resolution wins
//! - [`timeout`]: race a cell against a deadline
//! - [`retry`]: bounded re-invocation with exponential backoff
//! - [`poll`]: repeated status checks separated by timer delays

pub mod join;
pub mod poll;
pub mod race;
pub mod retry;
pub mod timeout;

pub use join::{join2, join3, join4, join_all};
pub use poll::{PollPolicy, PollStatus, poll};
pub use race::{race, race2};
pub use retry::{AlwaysRetry, NeverRetry, RetryIf, RetryPolicy, RetryPredicate, backoff_delay, retry};
pub use timeout::timeout;
