// src/dag/scheduler.rs

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dag::cause::{CancelReason, Cause, SkipCause};
use crate::dag::graph::DagGraph;
use crate::dag::propagate::FailurePropagator;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::UnitTable;
use crate::dag::unit::{ScheduledUnit, UnitName, UnitState};
use crate::engine::UnitOutcome;

/// Readiness-queue scheduler for a single run.
///
/// Holds the immutable graph plus the mutable state table. A unit enters the
/// ready queue exactly when its last prerequisite passes; nothing else makes
/// a unit eligible. The scheduler is synchronous and does no IO, so callers
/// must serialize access to it (the engine core owns it exclusively).
#[derive(Debug)]
pub struct Scheduler {
    graph: Arc<DagGraph>,
    table: UnitTable,
    ready: VecDeque<UnitName>,
    /// Logical clock, advanced on every dispatch and terminal transition.
    tick: u64,
    cancelled: Option<CancelReason>,
}

impl Scheduler {
    pub fn new(graph: Arc<DagGraph>) -> Self {
        let table = UnitTable::from_graph(&graph);
        let ready: VecDeque<UnitName> = table.units_in(UnitState::Ready).into();

        debug!(
            units = graph.len(),
            initially_ready = ready.len(),
            "scheduler initialised"
        );

        Self {
            graph,
            table,
            ready,
            tick: 0,
            cancelled: None,
        }
    }

    pub fn graph(&self) -> &DagGraph {
        &self.graph
    }

    pub fn table(&self) -> &UnitTable {
        &self.table
    }

    pub fn state_of(&self, unit: &str) -> Option<UnitState> {
        self.table.state_of(unit)
    }

    /// Current logical time.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// `true` once every unit reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.table.all_terminal()
    }

    pub fn cancelled(&self) -> Option<CancelReason> {
        self.cancelled
    }

    pub fn running_count(&self) -> usize {
        self.table.count_in(UnitState::Running)
    }

    /// Take the next `Ready` unit and mark it `Running`.
    ///
    /// Returns `None` when the queue is empty or the run was cancelled.
    pub fn next_ready(&mut self) -> Option<ScheduledUnit> {
        if self.cancelled.is_some() {
            return None;
        }

        while let Some(name) = self.ready.pop_front() {
            let tick = self.tick + 1;
            if self.table.start(&name, tick) {
                self.tick = tick;
                return Some(ScheduledUnit {
                    name,
                    start_tick: tick,
                });
            }
            // Skipped while queued; drop the stale entry.
            debug!(unit = %name, "dropping stale ready entry");
        }

        None
    }

    /// Record the outcome of a running unit.
    ///
    /// - `Passed`: each direct dependent loses one unsatisfied prerequisite;
    ///   those reaching zero are queued.
    /// - `Failed`: dependents are left untouched and every transitive
    ///   dependent still waiting is skipped.
    ///
    /// Completions for units that are not `Running` are ignored.
    pub fn handle_completion(&mut self, unit: &str, outcome: UnitOutcome) -> SchedulerStep {
        match self.table.state_of(unit) {
            Some(UnitState::Running) => {}
            Some(state) => {
                warn!(unit = %unit, %state, "completion for unit that is not running; ignoring");
                return SchedulerStep::default();
            }
            None => {
                warn!(unit = %unit, "completion for unknown unit; ignoring");
                return SchedulerStep::default();
            }
        }

        self.tick += 1;
        let tick = self.tick;
        let mut step = SchedulerStep::default();

        match outcome {
            UnitOutcome::Passed => {
                self.table.finish(unit, UnitState::Passed, None, tick);
                debug!(unit = %unit, tick, "unit passed");

                let graph = Arc::clone(&self.graph);
                for dependent in graph.dependents_of(unit) {
                    if self.table.satisfy_one(dependent) {
                        self.ready.push_back(dependent.clone());
                        step.newly_ready.push(dependent.clone());
                    }
                }
            }
            UnitOutcome::Failed(cause) => {
                warn!(unit = %unit, tick, %cause, "unit failed; skipping dependents");
                self.table
                    .finish(unit, UnitState::Failed, Some(Cause::Failed(cause)), tick);

                let graph = Arc::clone(&self.graph);
                step.newly_skipped =
                    FailurePropagator::new(&graph).on_failure(unit, &mut self.table, tick);
            }
        }

        step.run_just_finished = self.is_finished();
        step
    }

    /// Stop dispatching and skip every unit that has not started.
    ///
    /// Running units are untouched; their completions are still recorded.
    /// Calling this more than once keeps the first reason.
    pub fn cancel(&mut self, reason: CancelReason) -> SchedulerStep {
        if self.cancelled.is_some() {
            return SchedulerStep::default();
        }

        self.cancelled = Some(reason);
        self.ready.clear();
        self.tick += 1;
        let tick = self.tick;

        let mut waiting = self.table.units_in(UnitState::Pending);
        waiting.extend(self.table.units_in(UnitState::Ready));
        waiting.sort();

        let mut step = SchedulerStep::default();
        for name in waiting {
            let cause = Cause::Skipped(SkipCause::Cancelled { reason });
            if self.table.finish(&name, UnitState::Skipped, Some(cause), tick) {
                step.newly_skipped.push(name);
            }
        }

        info!(
            %reason,
            skipped = step.newly_skipped.len(),
            still_running = self.running_count(),
            "run cancelled; no further units will start"
        );

        step.run_just_finished = self.is_finished();
        step
    }
}
