// src/dag/unit.rs

//! Unit descriptors and per-run lifecycle state.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// Canonical unit identity used throughout the crate.
pub type UnitName = String;

/// Declared identity and prerequisites of one test unit.
///
/// Prerequisites are names only; they are resolved against the rest of the
/// registry by [`DagGraph::build`](crate::dag::DagGraph::build). Declaring the
/// same prerequisite twice collapses into a single edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSpec {
    pub name: UnitName,
    pub prerequisites: BTreeSet<UnitName>,
}

impl UnitSpec {
    pub fn new(name: impl Into<UnitName>) -> Self {
        Self {
            name: name.into(),
            prerequisites: BTreeSet::new(),
        }
    }

    /// Add a prerequisite, builder style.
    pub fn depends_on(mut self, prerequisite: impl Into<UnitName>) -> Self {
        self.prerequisites.insert(prerequisite.into());
        self
    }
}

/// Lifecycle state of a unit within a single run.
///
/// `Passed`, `Failed` and `Skipped` are terminal and write-once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitState {
    /// Waiting on at least one prerequisite.
    Pending,
    /// All prerequisites passed; waiting for a free worker.
    Ready,
    /// Handed to the executor.
    Running,
    Passed,
    Failed,
    /// Never ran: an ancestor failed or the run was cancelled.
    Skipped,
}

impl UnitState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            UnitState::Passed | UnitState::Failed | UnitState::Skipped
        )
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitState::Pending => "pending",
            UnitState::Ready => "ready",
            UnitState::Running => "running",
            UnitState::Passed => "passed",
            UnitState::Failed => "failed",
            UnitState::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// A unit the scheduler wants the executor to run now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledUnit {
    pub name: UnitName,
    /// Logical time at which the unit moved to `Running`.
    pub start_tick: u64,
}
