// src/engine/mod.rs

//! Orchestration engine for testdag.
//!
//! This module ties together:
//! - the readiness-queue scheduler
//! - a bounded pool of unit workers
//! - per-unit and whole-run timeouts
//! - cooperative cancellation
//! - incremental report collection
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::ExecutionContext;
use crate::dag::{CancelReason, DagGraph, FailureCause, UnitName};
use crate::errors::Result;
use crate::exec::UnitExecutor;
use crate::report::RunResult;

/// Outcome of one unit execution, as reported by the executor.
///
/// Exactly one outcome is produced per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Passed,
    Failed(FailureCause),
}

/// Events flowing into the core from workers and cancellation sources.
///
/// Times are offsets from the start of the run.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A worker finished executing a unit.
    UnitFinished {
        unit: UnitName,
        outcome: UnitOutcome,
        started_at: Duration,
        finished_at: Duration,
    },
    /// Stop starting new units.
    CancelRequested { reason: CancelReason, at: Duration },
}

pub mod core;
pub mod runtime;

pub use self::core::{CoreCommand, CoreRuntime, CoreStep};
pub use self::runtime::Runtime;

/// Run every unit of `graph` through `executor` and return the finished
/// result table.
///
/// `cancel` is an external cancellation source (e.g. Ctrl-C); cancelling it
/// behaves like the overall timeout elapsing.
pub async fn run_units<E: UnitExecutor>(
    graph: Arc<DagGraph>,
    executor: E,
    ctx: &ExecutionContext,
    cancel: CancellationToken,
) -> Result<RunResult> {
    let core = CoreRuntime::new(graph, ctx);
    Runtime::new(core, executor, ctx, cancel).run().await
}
