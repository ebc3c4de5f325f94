// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::unit::UnitName;

/// Structured result of a single scheduler "step".
///
/// Tests use this to step the DAG by hand and assert on what changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    /// Units that became `Ready` as a result of this step.
    pub newly_ready: Vec<UnitName>,
    /// Units newly marked `Skipped` in this step.
    pub newly_skipped: Vec<UnitName>,
    /// Whether every unit is now terminal.
    pub run_just_finished: bool,
}
