//! Ordering guarantees of the join and race combinators.

use settled::{Cause, CauseKind, Deferred, Outcome, join2, join3, join_all, race, race2};
use std::sync::Arc;
use std::sync::{Barrier, Mutex};
use std::thread;

#[test]
fn join3_returns_declared_order_when_the_last_input_finishes_first() {
    let d1: Deferred<&str> = Deferred::pending();
    let d2: Deferred<&str> = Deferred::pending();
    let d3: Deferred<&str> = Deferred::pending();
    let joined = join3(&d1, &d2, &d3);

    d3.succeed("v3");
    d2.succeed("v2");
    d1.succeed("v1");

    assert_eq!(joined.try_outcome(), Some(Outcome::success(("v1", "v2", "v3"))));
}

#[test]
fn race_ignores_a_fast_failure_when_a_success_arrives_later() {
    let d1: Deferred<&str> = Deferred::pending();
    let d2: Deferred<&str> = Deferred::pending();
    let raced = race2(&d1, &d2);

    d2.fail(Cause::user("fast failure"));
    d1.succeed("later success");

    assert_eq!(raced.try_outcome(), Some(Outcome::success("later success")));
}

#[test]
fn join_all_collects_cross_thread_completions_in_input_order() {
    let inputs: Vec<Deferred<usize>> = (0..8).map(|_| Deferred::pending()).collect();
    let joined = join_all(&inputs);

    let barrier = Arc::new(Barrier::new(inputs.len()));
    let handles: Vec<_> = inputs
        .iter()
        .enumerate()
        .map(|(value, input)| {
            let input = input.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                input.succeed(value);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(joined.wait(), Outcome::success((0..8).collect::<Vec<_>>()));
}

#[test]
fn race_across_threads_resolves_with_some_competitor_success() {
    let competitors: Vec<Deferred<usize>> = (0..6).map(|_| Deferred::pending()).collect();
    let raced = race(&competitors);

    let barrier = Arc::new(Barrier::new(competitors.len()));
    let handles: Vec<_> = competitors
        .iter()
        .enumerate()
        .map(|(value, competitor)| {
            let competitor = competitor.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                competitor.succeed(value);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let winner = raced.wait().unwrap();
    assert!(winner < 6);
}

#[test]
fn join_failure_leaves_siblings_running_and_observable() {
    let a: Deferred<i32> = Deferred::pending();
    let b: Deferred<i32> = Deferred::pending();
    let joined = join2(&a, &b);

    let sibling_outcomes = Arc::new(Mutex::new(Vec::new()));
    {
        let sibling_outcomes = Arc::clone(&sibling_outcomes);
        b.subscribe(move |outcome| sibling_outcomes.lock().unwrap().push(outcome));
    }

    a.fail(Cause::user("first failure"));
    assert_eq!(
        joined.try_outcome().unwrap().cause().map(Cause::message),
        Some("first failure")
    );

    // The sibling is untouched by the join's failure and resolves on its own.
    b.succeed(42);
    assert_eq!(
        sibling_outcomes.lock().unwrap().as_slice(),
        &[Outcome::success(42)]
    );
}

#[test]
fn race_all_fail_reports_exhaustion_wrapping_the_first_argument() {
    let competitors: Vec<Deferred<i32>> = (0..3).map(|_| Deferred::pending()).collect();
    let raced = race(&competitors);

    competitors[2].fail(Cause::user("third"));
    competitors[0].fail(Cause::user("first"));
    competitors[1].fail(Cause::user("second"));

    let outcome = raced.try_outcome().unwrap();
    let cause = outcome.cause().unwrap();
    assert_eq!(cause.kind(), CauseKind::Exhausted);
    assert_eq!(cause.source_cause().map(Cause::message), Some("first"));
}
