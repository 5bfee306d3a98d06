//! Core value types.
//!
//! - [`cause`]: structured failure payload ([`Cause`], [`CauseKind`])
//! - [`outcome`]: synchronous success/failure union ([`Outcome`]) and its
//!   aggregation helpers

pub mod cause;
pub mod outcome;

pub use cause::{Cause, CauseKind};
pub use outcome::{Outcome, collect, combine2, combine3, combine4};
