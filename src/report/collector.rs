// src/report/collector.rs

//! Incremental per-unit result collection.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::time::Duration;

use tracing::debug;

use crate::dag::{CancelReason, Cause, UnitName, UnitState, UnitTable};

/// Final record for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRecord {
    pub state: UnitState,
    /// Logical time the unit started running (`None` if it never ran).
    pub start_tick: Option<u64>,
    /// Logical time the unit reached its terminal state.
    pub end_tick: Option<u64>,
    /// Offset from run start at which the unit began executing.
    pub started_at: Option<Duration>,
    /// Offset from run start at which the terminal state was recorded.
    pub finished_at: Option<Duration>,
    pub cause: Option<Cause>,
}

impl UnitRecord {
    /// Wall-clock execution time; zero for units that never ran.
    pub fn duration(&self) -> Duration {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => end.saturating_sub(start),
            _ => Duration::ZERO,
        }
    }
}

/// Outcome table of a finished run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub units: BTreeMap<UnitName, UnitRecord>,
    pub total_duration: Duration,
    /// Set if the run was cancelled or timed out.
    pub cancelled: Option<CancelReason>,
}

impl RunResult {
    pub fn get(&self, unit: &str) -> Option<&UnitRecord> {
        self.units.get(unit)
    }

    pub fn state_of(&self, unit: &str) -> Option<UnitState> {
        self.units.get(unit).map(|r| r.state)
    }

    pub fn cause_of(&self, unit: &str) -> Option<&Cause> {
        self.units.get(unit).and_then(|r| r.cause.as_ref())
    }

    /// Names of units in `state`, in name order.
    pub fn units_in(&self, state: UnitState) -> Vec<&str> {
        self.units
            .iter()
            .filter(|(_, r)| r.state == state)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Collects unit records as units reach terminal states.
///
/// The first record for a unit wins; terminal states never change, so a
/// second record would only ever be a duplicate.
#[derive(Debug, Default)]
pub struct ReportCollector {
    records: BTreeMap<UnitName, UnitRecord>,
}

impl ReportCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, unit: &str, record: UnitRecord) {
        match self.records.entry(unit.to_string()) {
            Entry::Vacant(slot) => {
                debug!(unit = %unit, state = %record.state, "recorded unit result");
                slot.insert(record);
            }
            Entry::Occupied(_) => {
                debug!(unit = %unit, "result already recorded; keeping first");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Close the collection.
    ///
    /// Every unit in `table` ends up in the result; a unit that somehow has
    /// no record yet is filled in from its table entry.
    pub fn finalize(
        mut self,
        table: &UnitTable,
        total_duration: Duration,
        cancelled: Option<CancelReason>,
    ) -> RunResult {
        for (name, entry) in table.iter() {
            self.records
                .entry(name.to_string())
                .or_insert_with(|| UnitRecord {
                    state: entry.state,
                    start_tick: entry.start_tick,
                    end_tick: entry.end_tick,
                    started_at: None,
                    finished_at: None,
                    cause: entry.cause.clone(),
                });
        }

        RunResult {
            units: self.records,
            total_duration,
            cancelled,
        }
    }
}
