// src/dag/propagate.rs

//! Skip propagation after a unit fails.

use tracing::debug;

use crate::dag::cause::{Cause, SkipCause};
use crate::dag::graph::DagGraph;
use crate::dag::state_manager::UnitTable;
use crate::dag::unit::{UnitName, UnitState};

/// Marks the transitive dependents of a failed unit as `Skipped`.
///
/// Failure of any single prerequisite dooms a dependent immediately, even if
/// its other prerequisites are still pending.
pub struct FailurePropagator<'a> {
    graph: &'a DagGraph,
}

impl<'a> FailurePropagator<'a> {
    pub fn new(graph: &'a DagGraph) -> Self {
        Self { graph }
    }

    /// Skip every still-`Pending`/`Ready` unit that transitively requires
    /// `failed`, recording `failed` as the cause.
    ///
    /// Units that are already terminal keep their first recorded cause, so
    /// calling this again (or for another failed ancestor) is a no-op for
    /// them. Returns the newly skipped units in name order.
    pub fn on_failure(&self, failed: &str, table: &mut UnitTable, tick: u64) -> Vec<UnitName> {
        let Some(dependents) = self.graph.transitive_dependents_of(failed) else {
            return Vec::new();
        };

        let mut newly_skipped = Vec::new();

        for name in dependents {
            let skippable = matches!(
                table.state_of(name),
                Some(UnitState::Pending) | Some(UnitState::Ready)
            );
            if !skippable {
                continue;
            }

            let cause = Cause::Skipped(SkipCause::DependencyFailed {
                unit: failed.to_string(),
            });
            if table.finish(name, UnitState::Skipped, Some(cause), tick) {
                debug!(unit = %name, ancestor = %failed, "skipped due to upstream failure");
                newly_skipped.push(name.clone());
            }
        }

        newly_skipped
    }
}
