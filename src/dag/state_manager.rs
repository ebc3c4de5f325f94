// src/dag/state_manager.rs

//! Per-run state table: lifecycle state, unsatisfied-prerequisite counts and
//! recorded causes for every unit.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::dag::cause::Cause;
use crate::dag::graph::DagGraph;
use crate::dag::unit::{UnitName, UnitState};

/// Mutable per-unit entry.
#[derive(Debug, Clone)]
pub struct UnitEntry {
    pub state: UnitState,
    /// Direct prerequisites that have not reached `Passed` yet.
    pub remaining: usize,
    /// First recorded cause for `Failed`/`Skipped`; never overwritten.
    pub cause: Option<Cause>,
    pub start_tick: Option<u64>,
    pub end_tick: Option<u64>,
}

/// State of every unit in the current run.
///
/// Terminal states are write-once: [`UnitTable::finish`] refuses to touch a
/// unit that already reached `Passed`, `Failed` or `Skipped`.
#[derive(Debug, Clone)]
pub struct UnitTable {
    entries: BTreeMap<UnitName, UnitEntry>,
}

impl UnitTable {
    /// Fresh table for a new run: units without prerequisites start `Ready`,
    /// everything else `Pending`.
    pub fn from_graph(graph: &DagGraph) -> Self {
        let entries = graph
            .units()
            .map(|name| {
                let remaining = graph.dependencies_of(name).len();
                let state = if remaining == 0 {
                    UnitState::Ready
                } else {
                    UnitState::Pending
                };
                (
                    name.to_string(),
                    UnitEntry {
                        state,
                        remaining,
                        cause: None,
                        start_tick: None,
                        end_tick: None,
                    },
                )
            })
            .collect();

        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&UnitEntry> {
        self.entries.get(name)
    }

    pub fn state_of(&self, name: &str) -> Option<UnitState> {
        self.entries.get(name).map(|e| e.state)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UnitEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Units currently in `state`, in name order.
    pub fn units_in(&self, state: UnitState) -> Vec<UnitName> {
        self.entries
            .iter()
            .filter(|(_, e)| e.state == state)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn count_in(&self, state: UnitState) -> usize {
        self.entries.values().filter(|e| e.state == state).count()
    }

    pub fn all_terminal(&self) -> bool {
        self.entries.values().all(|e| e.state.is_terminal())
    }

    /// `Ready -> Running`. Returns `false` if the unit was not `Ready`.
    pub fn start(&mut self, name: &str, tick: u64) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) if entry.state == UnitState::Ready => {
                entry.state = UnitState::Running;
                entry.start_tick = Some(tick);
                debug!(unit = %name, tick, "marked Running");
                true
            }
            Some(_) => false,
            None => {
                warn!(unit = %name, "start for unknown unit; ignoring");
                false
            }
        }
    }

    /// Move a unit to a terminal state.
    ///
    /// Returns `false` without changing anything if the unit is unknown or
    /// already terminal.
    pub fn finish(
        &mut self,
        name: &str,
        state: UnitState,
        cause: Option<Cause>,
        tick: u64,
    ) -> bool {
        debug_assert!(state.is_terminal());

        let Some(entry) = self.entries.get_mut(name) else {
            warn!(unit = %name, "terminal transition for unknown unit; ignoring");
            return false;
        };

        if entry.state.is_terminal() {
            debug!(
                unit = %name,
                current = %entry.state,
                requested = %state,
                "unit already terminal; keeping first outcome"
            );
            return false;
        }

        entry.state = state;
        entry.end_tick = Some(tick);
        if entry.cause.is_none() {
            entry.cause = cause;
        }
        debug!(unit = %name, %state, tick, "marked terminal");
        true
    }

    /// Record that one prerequisite of `name` passed.
    ///
    /// Returns `true` exactly once: when the count reaches zero and the unit
    /// moves `Pending -> Ready`.
    pub fn satisfy_one(&mut self, name: &str) -> bool {
        let Some(entry) = self.entries.get_mut(name) else {
            return false;
        };

        entry.remaining = entry.remaining.saturating_sub(1);

        if entry.remaining == 0 && entry.state == UnitState::Pending {
            entry.state = UnitState::Ready;
            debug!(unit = %name, "all prerequisites passed; marked Ready");
            true
        } else {
            false
        }
    }
}
