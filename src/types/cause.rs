//! Structured failure payload.
//!
//! Every failure in this crate is a [`Cause`] value: a kind, a message, and
//! an optional wrapped cause. Raw panics never cross the outcome boundary;
//! they are captured at the edges (see [`crate::blocking`]) and converted
//! into a `Cause` with [`CauseKind::Panic`].

use core::fmt;
use thiserror::Error;

/// The kind of failure a [`Cause`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CauseKind {
    /// Application-level failure supplied by user code.
    User,
    /// A deadline elapsed before the operation resolved.
    Timeout,
    /// The operation was cancelled before it resolved.
    Cancelled,
    /// A panic was caught at an execution boundary.
    Panic,
    /// Every competitor or attempt was consumed without a success.
    Exhausted,
}

impl fmt::Display for CauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Timeout => write!(f, "timeout"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Panic => write!(f, "panic"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// A structured failure value: kind, message, optional wrapped cause.
///
/// `Cause` is an immutable value type. Wrapping builds a chain that is
/// exposed through [`std::error::Error::source`], so causes interoperate
/// with ordinary error-reporting stacks.
///
/// # Example
///
/// ```
/// use settled::{Cause, CauseKind};
///
/// let io = Cause::user("connection reset");
/// let cause = Cause::timeout("fetch deadline elapsed").with_source(io);
///
/// assert_eq!(cause.kind(), CauseKind::Timeout);
/// assert_eq!(cause.source_cause().unwrap().message(), "connection reset");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct Cause {
    kind: CauseKind,
    message: String,
    source: Option<Box<Cause>>,
}

impl Cause {
    /// Creates a cause with the given kind and message.
    #[must_use]
    pub fn new(kind: CauseKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an application-level failure cause.
    #[must_use]
    pub fn user(message: impl Into<String>) -> Self {
        Self::new(CauseKind::User, message)
    }

    /// Creates a timeout cause.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(CauseKind::Timeout, message)
    }

    /// Creates a cancellation cause.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(CauseKind::Cancelled, "cancelled before resolution")
    }

    /// Creates a cause from a captured panic message.
    #[must_use]
    pub fn panic(message: impl Into<String>) -> Self {
        Self::new(CauseKind::Panic, message)
    }

    /// Creates an exhaustion cause (all competitors or attempts consumed).
    #[must_use]
    pub fn exhausted(message: impl Into<String>) -> Self {
        Self::new(CauseKind::Exhausted, message)
    }

    /// Wraps another cause as the source of this one.
    #[must_use]
    pub fn with_source(mut self, source: Cause) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the kind of this cause.
    #[must_use]
    pub const fn kind(&self) -> CauseKind {
        self.kind
    }

    /// Returns the message of this cause.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the wrapped cause, if any.
    #[must_use]
    pub fn source_cause(&self) -> Option<&Cause> {
        self.source.as_deref()
    }

    /// Walks the source chain to the innermost cause.
    #[must_use]
    pub fn root(&self) -> &Cause {
        let mut current = self;
        while let Some(inner) = current.source_cause() {
            current = inner;
        }
        current
    }

    /// Returns true if this cause is a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self.kind, CauseKind::Timeout)
    }

    /// Returns true if this cause is a cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.kind, CauseKind::Cancelled)
    }

    /// Returns true if this cause is a captured panic.
    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self.kind, CauseKind::Panic)
    }
}
