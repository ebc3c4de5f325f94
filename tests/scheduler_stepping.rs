// tests/scheduler_stepping.rs
//
// Drives the synchronous scheduler by hand, playing the role of the worker
// pool.

use std::sync::Arc;

use testdag::dag::{
    CancelReason, Cause, DagGraph, FailureCause, FailurePropagator, Scheduler, SchedulerStep,
    SkipCause, UnitState, UnitTable,
};
use testdag::engine::UnitOutcome;
use testdag_test_utils::graph;

fn scheduler(units: &[(&str, &[&str])]) -> Scheduler {
    Scheduler::new(Arc::new(graph(units)))
}

fn diamond() -> Scheduler {
    scheduler(&[("A", &[]), ("B", &["A"]), ("C", &["A"]), ("D", &["B", "C"])])
}

fn drain_ready(s: &mut Scheduler) -> Vec<String> {
    std::iter::from_fn(|| s.next_ready()).map(|u| u.name).collect()
}

fn failed() -> UnitOutcome {
    UnitOutcome::Failed(FailureCause::ExitCode { code: 1 })
}

#[test]
fn roots_start_ready_others_pending() {
    let s = diamond();
    assert_eq!(s.state_of("A"), Some(UnitState::Ready));
    assert_eq!(s.state_of("B"), Some(UnitState::Pending));
    assert_eq!(s.state_of("D"), Some(UnitState::Pending));
    assert_eq!(s.table().get("D").map(|e| e.remaining), Some(2));
}

#[test]
fn diamond_runs_in_dependency_order() {
    let mut s = diamond();

    assert_eq!(drain_ready(&mut s), vec!["A"]);
    let step = s.handle_completion("A", UnitOutcome::Passed);
    assert_eq!(step.newly_ready, vec!["B", "C"]);
    assert!(!step.run_just_finished);

    assert_eq!(drain_ready(&mut s), vec!["B", "C"]);

    // D waits for both prerequisites.
    let step = s.handle_completion("B", UnitOutcome::Passed);
    assert!(step.newly_ready.is_empty());
    assert_eq!(s.state_of("D"), Some(UnitState::Pending));

    let step = s.handle_completion("C", UnitOutcome::Passed);
    assert_eq!(step.newly_ready, vec!["D"]);

    assert_eq!(drain_ready(&mut s), vec!["D"]);
    let step = s.handle_completion("D", UnitOutcome::Passed);
    assert!(step.run_just_finished);
    assert!(s.is_finished());
}

#[test]
fn ticks_respect_causality() {
    let mut s = diamond();
    drain_ready(&mut s);
    s.handle_completion("A", UnitOutcome::Passed);
    drain_ready(&mut s);
    s.handle_completion("C", UnitOutcome::Passed);
    s.handle_completion("B", UnitOutcome::Passed);
    drain_ready(&mut s);
    s.handle_completion("D", UnitOutcome::Passed);

    let t = s.table();
    let end_a = t.get("A").and_then(|e| e.end_tick).unwrap();
    let start_b = t.get("B").and_then(|e| e.start_tick).unwrap();
    let start_d = t.get("D").and_then(|e| e.start_tick).unwrap();
    let end_b = t.get("B").and_then(|e| e.end_tick).unwrap();
    let end_c = t.get("C").and_then(|e| e.end_tick).unwrap();

    assert!(end_a < start_b);
    assert!(end_b < start_d);
    assert!(end_c < start_d);
}

#[test]
fn failure_skips_transitive_dependents_but_not_siblings() {
    // Diamond; B fails while C is still running.
    let mut s = scheduler(&[("A", &[]), ("B", &["A"]), ("C", &["A"]), ("D", &["B", "C"])]);

    drain_ready(&mut s);
    s.handle_completion("A", UnitOutcome::Passed);
    drain_ready(&mut s);

    let step = s.handle_completion("B", failed());
    assert_eq!(step.newly_skipped, vec!["D"]);
    assert_eq!(s.state_of("D"), Some(UnitState::Skipped));
    assert_eq!(
        s.table().get("D").and_then(|e| e.cause.clone()),
        Some(Cause::Skipped(SkipCause::DependencyFailed {
            unit: "B".to_string()
        }))
    );

    // C is still running and finishes normally; D stays skipped.
    let step = s.handle_completion("C", UnitOutcome::Passed);
    assert!(step.newly_ready.is_empty());
    assert_eq!(s.state_of("C"), Some(UnitState::Passed));
    assert_eq!(s.state_of("D"), Some(UnitState::Skipped));
    assert!(s.is_finished());
}

#[test]
fn failure_dooms_dependent_with_other_prerequisite_pending() {
    // D needs B and C; B fails while C has not even started.
    let mut s = scheduler(&[("B", &[]), ("C0", &[]), ("C", &["C0"]), ("D", &["B", "C"])]);

    assert_eq!(s.next_ready().map(|u| u.name), Some("B".to_string()));
    s.handle_completion("B", failed());

    assert_eq!(s.state_of("D"), Some(UnitState::Skipped));
    assert_eq!(s.state_of("C"), Some(UnitState::Pending));
}

#[test]
fn first_failed_ancestor_wins() {
    let mut s = scheduler(&[("A", &[]), ("B", &[]), ("C", &["A", "B"])]);
    drain_ready(&mut s);

    s.handle_completion("B", failed());
    s.handle_completion("A", failed());

    let cause = s.table().get("C").and_then(|e| e.cause.clone());
    assert_eq!(
        cause.as_ref().and_then(|c| c.failed_ancestor()),
        Some("B")
    );
}

#[test]
fn duplicate_completion_is_ignored() {
    let mut s = scheduler(&[("A", &[]), ("B", &["A"])]);
    drain_ready(&mut s);

    s.handle_completion("A", UnitOutcome::Passed);
    let tick = s.tick();
    let step = s.handle_completion("A", failed());

    assert_eq!(step, SchedulerStep::default());
    assert_eq!(s.tick(), tick);
    assert_eq!(s.state_of("A"), Some(UnitState::Passed));
    assert_eq!(s.state_of("B"), Some(UnitState::Ready));
}

#[test]
fn completion_for_unknown_unit_is_ignored() {
    let mut s = scheduler(&[("A", &[])]);
    let step = s.handle_completion("ghost", UnitOutcome::Passed);
    assert_eq!(step, SchedulerStep::default());
}

#[test]
fn cancel_skips_waiting_units_and_blocks_dispatch() {
    let mut s = scheduler(&[("A", &[]), ("B", &[]), ("C", &["A"])]);
    assert_eq!(s.next_ready().map(|u| u.name), Some("A".to_string()));

    let step = s.cancel(CancelReason::RunTimeout);
    assert_eq!(step.newly_skipped, vec!["B", "C"]);
    assert!(!step.run_just_finished);
    assert_eq!(s.next_ready(), None);

    // A keeps running and its completion still counts.
    let step = s.handle_completion("A", UnitOutcome::Passed);
    assert!(step.run_just_finished);
    assert_eq!(s.state_of("A"), Some(UnitState::Passed));
    assert_eq!(
        s.table().get("C").and_then(|e| e.cause.clone()),
        Some(Cause::Skipped(SkipCause::Cancelled {
            reason: CancelReason::RunTimeout
        }))
    );
}

#[test]
fn second_cancel_keeps_first_reason() {
    let mut s = scheduler(&[("A", &[])]);
    s.cancel(CancelReason::Requested);
    let step = s.cancel(CancelReason::RunTimeout);

    assert_eq!(step, SchedulerStep::default());
    assert_eq!(s.cancelled(), Some(CancelReason::Requested));
}

#[test]
fn propagation_is_idempotent() {
    let g: DagGraph = graph(&[("A", &[]), ("B", &["A"]), ("C", &["B"])]);
    let mut table = UnitTable::from_graph(&g);
    table.start("A", 1);
    table.finish("A", UnitState::Failed, None, 2);

    let propagator = FailurePropagator::new(&g);
    assert_eq!(propagator.on_failure("A", &mut table, 3), vec!["B", "C"]);
    assert!(propagator.on_failure("A", &mut table, 4).is_empty());
    assert_eq!(table.get("C").and_then(|e| e.end_tick), Some(3));
}

#[test]
fn terminal_state_is_write_once() {
    let g = graph(&[("A", &[])]);
    let mut table = UnitTable::from_graph(&g);

    assert!(table.start("A", 1));
    assert!(!table.start("A", 2));
    assert!(table.finish("A", UnitState::Passed, None, 3));
    assert!(!table.finish(
        "A",
        UnitState::Failed,
        Some(Cause::Failed(FailureCause::Interrupted)),
        4
    ));
    assert_eq!(table.state_of("A"), Some(UnitState::Passed));
    assert_eq!(table.get("A").and_then(|e| e.cause.clone()), None);
}
