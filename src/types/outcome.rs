//! Synchronous success/failure container.
//!
//! [`Outcome`] is an immutable tagged union: exactly one of `Success(T)` or
//! `Failure(Cause)`. It has no concurrency concerns and no lifecycle beyond
//! construction; producers build it, combinators consume it.
//!
//! A failure is absorbing under [`map`](Outcome::map),
//! [`and_then`](Outcome::and_then), and [`filter`](Outcome::filter): once an
//! outcome is a failure, every further transformation passes it through
//! unchanged. These laws are exercised in `tests/outcome_laws.rs`.
//!
//! Operations on `Outcome` are cheaper per step than the equivalent
//! [`Deferred`](crate::Deferred) operations; latency-critical synchronous
//! paths should prefer `Outcome` and reserve `Deferred` for genuinely
//! asynchronous boundaries (timers, cross-thread handoff).

use super::cause::Cause;
use core::fmt;

/// The outcome of an operation: success with a value, or failure with a
/// structured cause.
///
/// # Example
///
/// ```
/// use settled::{Cause, Outcome};
///
/// let doubled = Outcome::success(21).map(|x| x * 2);
/// assert_eq!(doubled.success_ref(), Some(&42));
///
/// let failed: Outcome<i32> = Outcome::failure(Cause::user("bad input"));
/// assert!(failed.map(|x| x * 2).is_failure());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation succeeded with a value.
    Success(T),
    /// The operation failed with a cause.
    Failure(Cause),
}

impl<T> Outcome<T> {
    /// Creates a successful outcome.
    #[must_use]
    pub const fn success(value: T) -> Self {
        Self::Success(value)
    }

    /// Creates a failed outcome.
    #[must_use]
    pub const fn failure(cause: Cause) -> Self {
        Self::Failure(cause)
    }

    /// Returns true if this outcome is a success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns true if this outcome is a failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Returns a reference to the success value, if any.
    #[must_use]
    pub const fn success_ref(&self) -> Option<&T> {
        match self {
            Self::Success(v) => Some(v),
            Self::Failure(_) => None,
        }
    }

    /// Returns a reference to the failure cause, if any.
    #[must_use]
    pub const fn cause(&self) -> Option<&Cause> {
        match self {
            Self::Success(_) => None,
            Self::Failure(c) => Some(c),
        }
    }

    /// Applies `f` to the success value; a failure passes through unchanged.
    ///
    /// `f` must not itself signal failure; use [`and_then`](Self::and_then)
    /// if it can.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Self::Success(v) => Outcome::Success(f(v)),
            Self::Failure(c) => Outcome::Failure(c),
        }
    }

    /// Applies `f` to the success value to obtain another outcome.
    ///
    /// A failure short-circuits; `f` is never invoked on it.
    pub fn and_then<U, F: FnOnce(T) -> Outcome<U>>(self, f: F) -> Outcome<U> {
        match self {
            Self::Success(v) => f(v),
            Self::Failure(c) => Outcome::Failure(c),
        }
    }

    /// Converts a success that fails `predicate` into a failure built from
    /// `cause_fn`; otherwise passes through.
    pub fn filter<P, C>(self, predicate: P, cause_fn: C) -> Self
    where
        P: FnOnce(&T) -> bool,
        C: FnOnce() -> Cause,
    {
        match self {
            Self::Success(v) if predicate(&v) => Self::Success(v),
            Self::Success(_) => Self::Failure(cause_fn()),
            Self::Failure(c) => Self::Failure(c),
        }
    }

    /// Eliminates the union into a single value, exhaustively.
    pub fn fold<R, FF, FS>(self, on_failure: FF, on_success: FS) -> R
    where
        FF: FnOnce(Cause) -> R,
        FS: FnOnce(T) -> R,
    {
        match self {
            Self::Success(v) => on_success(v),
            Self::Failure(c) => on_failure(c),
        }
    }

    /// Converts a failure into a success via `f(cause)`; success untouched.
    pub fn recover<F: FnOnce(Cause) -> T>(self, f: F) -> Self {
        match self {
            Self::Success(v) => Self::Success(v),
            Self::Failure(c) => Self::Success(f(c)),
        }
    }

    /// Transforms the failure cause; success untouched.
    pub fn map_cause<F: FnOnce(Cause) -> Cause>(self, f: F) -> Self {
        match self {
            Self::Success(v) => Self::Success(v),
            Self::Failure(c) => Self::Failure(f(c)),
        }
    }

    /// Converts this outcome into a standard `Result`.
    pub fn into_result(self) -> Result<T, Cause> {
        match self {
            Self::Success(v) => Ok(v),
            Self::Failure(c) => Err(c),
        }
    }

    /// Returns the success value or panics.
    ///
    /// # Panics
    ///
    /// Panics if the outcome is a failure.
    #[track_caller]
    pub fn unwrap(self) -> T {
        match self {
            Self::Success(v) => v,
            Self::Failure(c) => panic!("called `Outcome::unwrap()` on a `Failure` value: {c}"),
        }
    }

    /// Returns the success value or a default.
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Self::Success(v) => v,
            Self::Failure(_) => default,
        }
    }

    /// Returns the success value or computes one from the cause.
    pub fn unwrap_or_else<F: FnOnce(Cause) -> T>(self, f: F) -> T {
        match self {
            Self::Success(v) => v,
            Self::Failure(c) => f(c),
        }
    }
}

impl<T> From<Result<T, Cause>> for Outcome<T> {
    fn from(result: Result<T, Cause>) -> Self {
        match result {
            Ok(v) => Self::Success(v),
            Err(c) => Self::Failure(c),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(v) => write!(f, "success: {v}"),
            Self::Failure(c) => write!(f, "failure: {c}"),
        }
    }
}

/// Collects outcomes into an outcome of values.
///
/// Succeeds with all values in input order iff every element succeeded;
/// otherwise fails with the cause of the first failing element in input
/// order. This type has no concurrency, so "first" is unambiguous index
/// order.
///
/// # Example
///
/// ```
/// use settled::{collect, Cause, Outcome};
///
/// let all = collect([Outcome::success(1), Outcome::success(2)]);
/// assert_eq!(all, Outcome::success(vec![1, 2]));
///
/// let cause = Cause::user("boom");
/// let mixed = collect([
///     Outcome::success(1),
///     Outcome::failure(cause.clone()),
///     Outcome::success(2),
/// ]);
/// assert_eq!(mixed.cause(), Some(&cause));
/// ```
pub fn collect<T, I>(outcomes: I) -> Outcome<Vec<T>>
where
    I: IntoIterator<Item = Outcome<T>>,
{
    let iter = outcomes.into_iter();
    let mut values = Vec::with_capacity(iter.size_hint().0);
    for outcome in iter {
        match outcome {
            Outcome::Success(v) => values.push(v),
            Outcome::Failure(c) => return Outcome::Failure(c),
        }
    }
    Outcome::Success(values)
}

/// Applies `combiner` to both success values iff both succeed; otherwise
/// yields the first failure in argument order.
pub fn combine2<A, B, R, F>(a: Outcome<A>, b: Outcome<B>, combiner: F) -> Outcome<R>
where
    F: FnOnce(A, B) -> R,
{
    a.and_then(|a| b.map(|b| combiner(a, b)))
}

/// Applies `combiner` to all three success values iff all succeed; otherwise
/// yields the first failure in argument order.
pub fn combine3<A, B, C, R, F>(
    a: Outcome<A>,
    b: Outcome<B>,
    c: Outcome<C>,
    combiner: F,
) -> Outcome<R>
where
    F: FnOnce(A, B, C) -> R,
{
    a.and_then(|a| b.and_then(|b| c.map(|c| combiner(a, b, c))))
}

/// Applies `combiner` to all four success values iff all succeed; otherwise
/// yields the first failure in argument order.
pub fn combine4<A, B, C, D, R, F>(
    a: Outcome<A>,
    b: Outcome<B>,
    c: Outcome<C>,
    d: Outcome<D>,
    combiner: F,
) -> Outcome<R>
where
    F: FnOnce(A, B, C, D) -> R,
{
    a.and_then(|a| b.and_then(|b| c.and_then(|c| d.map(|d| combiner(a, b, c, d)))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::cause::CauseKind;

    // =========================================================================
    // Predicate and Accessor Tests
    // =========================================================================

    #[test]
    fn predicates() {
        let ok: Outcome<i32> = Outcome::success(42);
        let bad: Outcome<i32> = Outcome::failure(Cause::user("error"));

        assert!(ok.is_success());
        assert!(!ok.is_failure());
        assert!(bad.is_failure());
        assert!(!bad.is_success());
    }

    #[test]
    fn accessors() {
        let ok: Outcome<i32> = Outcome::success(42);
        let bad: Outcome<i32> = Outcome::failure(Cause::user("error"));

        assert_eq!(ok.success_ref(), Some(&42));
        assert!(ok.cause().is_none());
        assert_eq!(bad.cause().map(Cause::message), Some("error"));
        assert!(bad.success_ref().is_none());
    }

    // =========================================================================
    // Transformation Tests
    // =========================================================================

    #[test]
    fn map_transforms_success() {
        let outcome = Outcome::success(21).map(|x| x * 2);
        assert_eq!(outcome, Outcome::success(42));
    }

    #[test]
    fn map_passes_failure_through() {
        let cause = Cause::user("error");
        let outcome: Outcome<i32> = Outcome::failure(cause.clone());
        assert_eq!(outcome.map(|x| x * 2), Outcome::failure(cause));
    }

    #[test]
    fn and_then_chains_success() {
        let outcome = Outcome::success(21).and_then(|x| Outcome::success(x * 2));
        assert_eq!(outcome, Outcome::success(42));
    }

    #[test]
    fn and_then_short_circuits_on_failure() {
        let cause = Cause::user("error");
        let outcome: Outcome<i32> = Outcome::failure(cause.clone());
        let chained = outcome.and_then(|_| -> Outcome<i32> {
            panic!("and_then must not invoke f on failure")
        });
        assert_eq!(chained, Outcome::failure(cause));
    }

    #[test]
    fn filter_converts_rejected_success_into_failure() {
        let outcome = Outcome::success(3).filter(|v| *v % 2 == 0, || Cause::user("odd"));
        assert_eq!(outcome.cause().map(Cause::message), Some("odd"));
    }

    #[test]
    fn filter_passes_accepted_success_through() {
        let outcome = Outcome::success(4).filter(|v| *v % 2 == 0, || Cause::user("odd"));
        assert_eq!(outcome, Outcome::success(4));
    }

    #[test]
    fn filter_passes_failure_through_without_invoking_cause_fn() {
        let cause = Cause::user("original");
        let outcome: Outcome<i32> = Outcome::failure(cause.clone());
        let filtered = outcome.filter(|_| false, || panic!("cause_fn must not run on failure"));
        assert_eq!(filtered, Outcome::failure(cause));
    }

    #[test]
    fn fold_eliminates_both_variants() {
        let ok: Outcome<i32> = Outcome::success(42);
        let bad: Outcome<i32> = Outcome::failure(Cause::user("error"));

        assert_eq!(ok.fold(|_| 0, |v| v), 42);
        assert_eq!(bad.fold(|_| 0, |v| v), 0);
    }

    #[test]
    fn recover_converts_failure_to_success() {
        let outcome: Outcome<i32> = Outcome::failure(Cause::user("error"));
        assert_eq!(outcome.recover(|c| c.message().len() as i32), Outcome::success(5));
    }

    #[test]
    fn recover_leaves_success_untouched() {
        let outcome = Outcome::success(42).recover(|_| 0);
        assert_eq!(outcome, Outcome::success(42));
    }

    #[test]
    fn map_cause_transforms_failure_only() {
        let outcome: Outcome<i32> = Outcome::failure(Cause::user("inner"));
        let wrapped = outcome.map_cause(|c| Cause::timeout("outer").with_source(c));
        assert_eq!(wrapped.cause().map(Cause::kind), Some(CauseKind::Timeout));

        let ok = Outcome::success(1).map_cause(|_| panic!("must not run on success"));
        assert_eq!(ok, Outcome::success(1));
    }

    // =========================================================================
    // Aggregation Tests
    // =========================================================================

    #[test]
    fn collect_preserves_input_order() {
        let all = collect(vec![Outcome::success(1), Outcome::success(2), Outcome::success(3)]);
        assert_eq!(all, Outcome::success(vec![1, 2, 3]));
    }

    #[test]
    fn collect_fails_with_first_failure_in_index_order() {
        let first = Cause::user("first");
        let second = Cause::user("second");
        let mixed = collect(vec![
            Outcome::success(1),
            Outcome::failure(first.clone()),
            Outcome::failure(second),
            Outcome::success(2),
        ]);
        assert_eq!(mixed.cause(), Some(&first));
    }

    #[test]
    fn collect_of_empty_is_empty_success() {
        let empty: Outcome<Vec<i32>> = collect(Vec::new());
        assert_eq!(empty, Outcome::success(Vec::new()));
    }

    #[test]
    fn combine2_applies_combiner_when_both_succeed() {
        let combined = combine2(Outcome::success(40), Outcome::success(2), |a, b| a + b);
        assert_eq!(combined, Outcome::success(42));
    }

    #[test]
    fn combine_yields_first_failure_in_argument_order() {
        let first = Cause::user("first");
        let second = Cause::user("second");

        let combined = combine2::<i32, i32, i32, _>(
            Outcome::failure(first.clone()),
            Outcome::failure(second),
            |a, b| a + b,
        );
        assert_eq!(combined.cause(), Some(&first));
    }

    #[test]
    fn combine3_and_combine4() {
        let three = combine3(
            Outcome::success(1),
            Outcome::success(2),
            Outcome::success(3),
            |a, b, c| a + b + c,
        );
        assert_eq!(three, Outcome::success(6));

        let four = combine4(
            Outcome::success("a"),
            Outcome::success("b"),
            Outcome::success("c"),
            Outcome::success("d"),
            |a, b, c, d| format!("{a}{b}{c}{d}"),
        );
        assert_eq!(four, Outcome::success("abcd".to_string()));
    }

    // =========================================================================
    // Conversion Tests
    // =========================================================================

    #[test]
    fn result_round_trip() {
        let ok: Outcome<i32> = Ok(42).into();
        assert_eq!(ok.into_result(), Ok(42));

        let cause = Cause::user("error");
        let bad: Outcome<i32> = Err(cause.clone()).into();
        assert_eq!(bad.into_result(), Err(cause));
    }

    #[test]
    fn unwrap_family() {
        assert_eq!(Outcome::success(42).unwrap(), 42);
        assert_eq!(Outcome::<i32>::failure(Cause::user("e")).unwrap_or(7), 7);
        assert_eq!(
            Outcome::<usize>::failure(Cause::user("abc")).unwrap_or_else(|c| c.message().len()),
            3
        );
    }

    #[test]
    #[should_panic(expected = "called `Outcome::unwrap()` on a `Failure` value")]
    fn unwrap_panics_on_failure() {
        let bad: Outcome<i32> = Outcome::failure(Cause::user("error"));
        let _ = bad.unwrap();
    }
}
