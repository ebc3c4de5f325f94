// src/dag/mod.rs

//! Unit graph representation and scheduling.
//!
//! - [`unit`] holds unit descriptors and lifecycle states.
//! - [`graph`] builds and validates the dependency graph.
//! - [`scheduler`] contains the per-run readiness-queue state machine.
//! - [`propagate`] skips the dependents of failed units.
//! - [`state_manager`] owns the per-unit state table.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`cause`] describes why units failed or were skipped.

pub mod cause;
pub mod graph;
pub mod propagate;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod unit;

pub use cause::{CancelReason, Cause, FailureCause, SkipCause};
pub use graph::DagGraph;
pub use propagate::FailurePropagator;
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use state_manager::{UnitEntry, UnitTable};
pub use unit::{ScheduledUnit, UnitName, UnitSpec, UnitState};
