// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated scheduler state and report
//! - a list of commands describing what the IO shell should do next
//!
//! The core is the only owner of the state table. Workers never touch it;
//! they report back through events that the shell feeds in one at a time,
//! which makes every decrement and state transition atomic with respect to
//! concurrent completions.
//!
//! The core has no channels, no Tokio types and performs no IO, so it can be
//! tested by stepping events by hand.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::ExecutionContext;
use crate::dag::{CancelReason, DagGraph, ScheduledUnit, Scheduler, UnitState};
use crate::engine::{RuntimeEvent, UnitOutcome};
use crate::report::{ReportCollector, RunResult, UnitRecord};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start these units on free workers.
    Dispatch(Vec<ScheduledUnit>),
    /// Signal running units to stop (hard cancellation).
    InterruptRunning,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone, Default)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// `false` once every unit is terminal.
    pub keep_running: bool,
}

#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    collector: ReportCollector,
    concurrency: usize,
    hard_cancel: bool,
    in_flight: usize,
}

impl CoreRuntime {
    pub fn new(graph: Arc<DagGraph>, ctx: &ExecutionContext) -> Self {
        Self {
            scheduler: Scheduler::new(graph),
            collector: ReportCollector::new(),
            concurrency: ctx.concurrency.max(1),
            hard_cancel: ctx.hard_cancel,
            in_flight: 0,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    pub fn is_cancelled(&self) -> bool {
        self.scheduler.cancelled().is_some()
    }

    /// Units handed to workers whose completion has not arrived yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Dispatch the initially ready units.
    pub fn start(&mut self) -> CoreStep {
        info!(
            units = self.scheduler.graph().len(),
            concurrency = self.concurrency,
            "starting run"
        );
        self.finish_step(Vec::new())
    }

    /// Handle a single event, updating core state and returning the resulting
    /// commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        let mut commands = Vec::new();

        match event {
            RuntimeEvent::UnitFinished {
                unit,
                outcome,
                started_at,
                finished_at,
            } => self.on_unit_finished(&unit, outcome, started_at, finished_at),
            RuntimeEvent::CancelRequested { reason, at } => {
                if self.on_cancel(reason, at) && self.hard_cancel && self.in_flight > 0 {
                    commands.push(CoreCommand::InterruptRunning);
                }
            }
        }

        self.finish_step(commands)
    }

    /// Consume the core and hand back the collected results.
    pub fn into_result(self, total_duration: Duration) -> RunResult {
        if !self.scheduler.is_finished() {
            warn!("building result for a run that has non-terminal units");
        }

        let cancelled = self.scheduler.cancelled();
        let table = self.scheduler.table();
        self.collector.finalize(table, total_duration, cancelled)
    }

    fn on_unit_finished(
        &mut self,
        unit: &str,
        outcome: UnitOutcome,
        started_at: Duration,
        finished_at: Duration,
    ) {
        if self.scheduler.state_of(unit) != Some(UnitState::Running) {
            warn!(unit = %unit, "ignoring completion for unit that is not running");
            return;
        }

        self.in_flight = self.in_flight.saturating_sub(1);

        match &outcome {
            UnitOutcome::Passed => info!(
                unit = %unit,
                duration_ms = (finished_at.saturating_sub(started_at)).as_millis() as u64,
                "unit passed"
            ),
            UnitOutcome::Failed(cause) => warn!(unit = %unit, %cause, "unit failed"),
        }

        let step = self.scheduler.handle_completion(unit, outcome);
        self.record(unit, Some(started_at), finished_at);

        for skipped in &step.newly_skipped {
            warn!(unit = %skipped, ancestor = %unit, "unit skipped");
            self.record(skipped, None, finished_at);
        }

        if !step.newly_ready.is_empty() {
            debug!(ready = ?step.newly_ready, "units became ready");
        }
    }

    /// Returns `true` if this call actually cancelled the run.
    fn on_cancel(&mut self, reason: CancelReason, at: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }

        let step = self.scheduler.cancel(reason);
        for skipped in &step.newly_skipped {
            self.record(skipped, None, at);
        }
        true
    }

    /// Copy the scheduler's terminal view of `unit` into the report.
    fn record(&mut self, unit: &str, started_at: Option<Duration>, finished_at: Duration) {
        let Some(entry) = self.scheduler.table().get(unit) else {
            return;
        };
        self.collector.record(
            unit,
            UnitRecord {
                state: entry.state,
                start_tick: entry.start_tick,
                end_tick: entry.end_tick,
                started_at,
                finished_at: Some(finished_at),
                cause: entry.cause.clone(),
            },
        );
    }

    /// Fill free worker slots and decide whether the loop continues.
    fn finish_step(&mut self, mut commands: Vec<CoreCommand>) -> CoreStep {
        let mut dispatch = Vec::new();
        while self.in_flight < self.concurrency {
            match self.scheduler.next_ready() {
                Some(unit) => {
                    debug!(unit = %unit.name, tick = unit.start_tick, "dispatching unit");
                    self.in_flight += 1;
                    dispatch.push(unit);
                }
                None => break,
            }
        }

        if !dispatch.is_empty() {
            commands.push(CoreCommand::Dispatch(dispatch));
        }

        let keep_running = !self.scheduler.is_finished();
        if !keep_running {
            info!(tick = self.scheduler.tick(), "all units terminal; run finished");
        }

        CoreStep {
            commands,
            keep_running,
        }
    }
}
