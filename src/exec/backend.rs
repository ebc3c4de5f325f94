// src/exec/backend.rs

//! Pluggable unit executor abstraction.
//!
//! The runtime hands each dispatched unit to a `UnitExecutor` and awaits the
//! returned future for its outcome. This keeps what a unit actually *does*
//! (an HTTP scenario, a browser flow, a shell command) out of the scheduler.
//!
//! - [`ShellExecutor`](crate::exec::ShellExecutor) is the implementation used
//!   by the `testdag` binary.
//! - Tests provide their own executor that scripts outcomes and delays.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::dag::ScheduledUnit;
use crate::engine::UnitOutcome;

/// Future returned by [`UnitExecutor::execute`].
pub type UnitFuture = Pin<Box<dyn Future<Output = UnitOutcome> + Send + 'static>>;

/// Trait abstracting how a single unit is executed.
pub trait UnitExecutor: Send + Sync + 'static {
    /// Execute `unit` and resolve to exactly one outcome.
    ///
    /// `cancel` fires when the run is hard-cancelled or the unit's timeout
    /// elapses. Implementations that can stop early should do so and report
    /// [`FailureCause::Interrupted`](crate::dag::FailureCause::Interrupted);
    /// others may ignore it. The future may also simply be dropped after a
    /// timeout.
    fn execute(&self, unit: ScheduledUnit, cancel: CancellationToken) -> UnitFuture;
}
