// src/engine/runtime.rs

use std::fmt;
use std::future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ExecutionContext;
use crate::dag::{CancelReason, FailureCause, ScheduledUnit};
use crate::errors::Result;
use crate::exec::UnitExecutor;
use crate::report::RunResult;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent, UnitOutcome};

/// Drives [`CoreRuntime`] and runs dispatched units on Tokio tasks.
///
/// This is a pure IO shell: it owns the event channel, the run clock, the
/// timers and the cancellation tokens. All scheduling decisions are made by
/// the core.
pub struct Runtime<E: UnitExecutor> {
    core: CoreRuntime,
    executor: Arc<E>,
    unit_timeout: Option<Duration>,
    run_timeout: Option<Duration>,
    /// External cancellation (Ctrl-C, embedding code).
    cancel: CancellationToken,
    /// Parent of every worker's token; cancelled for hard cancellation.
    interrupt: CancellationToken,
    event_tx: mpsc::Sender<RuntimeEvent>,
    event_rx: mpsc::Receiver<RuntimeEvent>,
}

impl<E: UnitExecutor> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("unit_timeout", &self.unit_timeout)
            .field("run_timeout", &self.run_timeout)
            .finish_non_exhaustive()
    }
}

impl<E: UnitExecutor> Runtime<E> {
    pub fn new(
        core: CoreRuntime,
        executor: E,
        ctx: &ExecutionContext,
        cancel: CancellationToken,
    ) -> Self {
        let capacity = ctx.concurrency.max(1) * 2 + 8;
        let (event_tx, event_rx) = mpsc::channel(capacity);

        Self {
            core,
            executor: Arc::new(executor),
            unit_timeout: ctx.unit_timeout,
            run_timeout: ctx.timeout,
            cancel,
            interrupt: CancellationToken::new(),
            event_tx,
            event_rx,
        }
    }

    /// Main event loop.
    ///
    /// - Dispatches the initially ready units.
    /// - Feeds worker completions and cancellation into the core.
    /// - Executes the commands the core returns.
    /// - Returns once every unit is terminal; after cancellation that means
    ///   once the running units have drained.
    pub async fn run(mut self) -> Result<RunResult> {
        let run_start = Instant::now();
        // A timeout too large to represent as an instant never fires.
        let deadline = self.run_timeout.and_then(|t| run_start.checked_add(t));
        info!(?deadline, unit_timeout = ?self.unit_timeout, "testdag runtime started");

        // Cancelled before anything was dispatched: skip everything.
        if self.cancel.is_cancelled() {
            warn!("cancellation requested before start; no unit will run");
            let step = self.core.step(RuntimeEvent::CancelRequested {
                reason: CancelReason::Requested,
                at: run_start.elapsed(),
            });
            self.execute_commands(step.commands, run_start);
        }

        let step = self.core.start();
        let mut keep_running = step.keep_running;
        self.execute_commands(step.commands, run_start);

        while keep_running {
            if self.core.in_flight() == 0 {
                error!("no running units but run not finished");
                return Err(anyhow!("scheduler stalled with no running units").into());
            }

            let cancellable = !self.core.is_cancelled();

            let event = tokio::select! {
                event = self.event_rx.recv() => match event {
                    Some(event) => event,
                    None => {
                        return Err(anyhow!("runtime event channel closed").into());
                    }
                },
                _ = sleep_until_deadline(deadline), if cancellable => {
                    warn!("overall run timeout elapsed; cancelling run");
                    RuntimeEvent::CancelRequested {
                        reason: CancelReason::RunTimeout,
                        at: run_start.elapsed(),
                    }
                }
                _ = self.cancel.cancelled(), if cancellable => {
                    warn!("cancellation requested; cancelling run");
                    RuntimeEvent::CancelRequested {
                        reason: CancelReason::Requested,
                        at: run_start.elapsed(),
                    }
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            keep_running = step.keep_running;
            self.execute_commands(step.commands, run_start);
        }

        let total = run_start.elapsed();
        info!(total_ms = total.as_millis() as u64, "runtime exiting");
        Ok(self.core.into_result(total))
    }

    fn execute_commands(&self, commands: Vec<CoreCommand>, run_start: Instant) {
        for command in commands {
            match command {
                CoreCommand::Dispatch(units) => {
                    for unit in units {
                        self.spawn_unit(unit, run_start);
                    }
                }
                CoreCommand::InterruptRunning => {
                    info!("signalling running units to stop");
                    self.interrupt.cancel();
                }
            }
        }
    }

    /// Run one unit on its own Tokio task and report back with exactly one
    /// `UnitFinished` event, whatever happens to the executor future.
    fn spawn_unit(&self, unit: ScheduledUnit, run_start: Instant) {
        let executor = Arc::clone(&self.executor);
        let tx = self.event_tx.clone();
        let token = self.interrupt.child_token();
        let unit_timeout = self.unit_timeout;

        tokio::spawn(async move {
            let name = unit.name.clone();
            let started_at = run_start.elapsed();
            info!(unit = %name, tick = unit.start_tick, "unit started");

            let mut handle = tokio::spawn(executor.execute(unit, token.clone()));

            let joined = match unit_timeout {
                Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        warn!(unit = %name, ?limit, "unit timed out; stopping it");
                        token.cancel();
                        handle.abort();
                        Ok(UnitOutcome::Failed(FailureCause::timeout(limit)))
                    }
                },
                None => (&mut handle).await,
            };

            let outcome = joined.unwrap_or_else(|err| {
                error!(unit = %name, error = %err, "unit executor task did not complete");
                UnitOutcome::Failed(FailureCause::error(format!("executor task failed: {err}")))
            });

            let event = RuntimeEvent::UnitFinished {
                unit: name.clone(),
                outcome,
                started_at,
                finished_at: run_start.elapsed(),
            };
            if tx.send(event).await.is_err() {
                debug!(unit = %name, "runtime gone before completion could be reported");
            }
        });
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}
