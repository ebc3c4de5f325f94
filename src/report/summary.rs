// src/report/summary.rs

use std::time::Duration;

use serde::Serialize;

use crate::dag::{Cause, UnitName, UnitState};
use crate::report::collector::RunResult;

/// Overall verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every unit passed.
    Passed,
    /// At least one unit failed.
    Failed,
    /// Nothing failed, but some units never ran (cancellation or timeout).
    Incomplete,
}

impl RunStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Passed => 0,
            RunStatus::Failed | RunStatus::Incomplete => 1,
        }
    }
}

/// One line of the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSummary {
    pub name: UnitName,
    pub state: UnitState,
    pub duration: Duration,
    /// Present for `Failed` and `Skipped` units.
    pub cause: Option<Cause>,
}

/// Aggregated view of a [`RunResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_duration: Duration,
    /// Ordered by unit name.
    pub units: Vec<UnitSummary>,
    pub status: RunStatus,
}

impl Summary {
    pub fn finalize(result: &RunResult) -> Self {
        let mut passed = 0;
        let mut failed = 0;
        let mut skipped = 0;
        let mut units = Vec::with_capacity(result.units.len());

        // BTreeMap iteration is already in name order.
        for (name, record) in &result.units {
            match record.state {
                UnitState::Passed => passed += 1,
                UnitState::Failed => failed += 1,
                UnitState::Skipped => skipped += 1,
                // Only reachable if the run was finalized early.
                UnitState::Pending | UnitState::Ready | UnitState::Running => skipped += 1,
            }

            units.push(UnitSummary {
                name: name.clone(),
                state: record.state,
                duration: record.duration(),
                cause: record.cause.clone(),
            });
        }

        let status = if failed > 0 {
            RunStatus::Failed
        } else if skipped > 0 {
            RunStatus::Incomplete
        } else {
            RunStatus::Passed
        };

        Self {
            passed,
            failed,
            skipped,
            total_duration: result.total_duration,
            units,
            status,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }

    pub fn total(&self) -> usize {
        self.units.len()
    }
}
