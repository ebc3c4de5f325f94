use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use testdag::dag::{FailureCause, ScheduledUnit};
use testdag::engine::UnitOutcome;
use testdag::exec::{UnitExecutor, UnitFuture};

/// What a scripted unit does when executed.
#[derive(Debug, Clone)]
pub struct Script {
    pub outcome: UnitOutcome,
    pub delay: Duration,
    /// Keep sleeping even when the unit's cancellation token fires.
    pub ignore_cancel: bool,
}

impl Script {
    pub fn pass(delay: Duration) -> Self {
        Self {
            outcome: UnitOutcome::Passed,
            delay,
            ignore_cancel: false,
        }
    }

    pub fn fail(delay: Duration) -> Self {
        Self {
            outcome: UnitOutcome::Failed(FailureCause::ExitCode { code: 1 }),
            delay,
            ignore_cancel: false,
        }
    }

    pub fn stubborn(mut self) -> Self {
        self.ignore_cancel = true;
        self
    }
}

/// One recorded execution.
#[derive(Debug, Clone)]
pub struct Execution {
    pub unit: String,
    pub start_tick: u64,
    pub started: Instant,
    /// `None` if the future was dropped before finishing (e.g. timed out).
    pub finished: Option<Instant>,
    pub outcome: Option<UnitOutcome>,
}

#[derive(Debug, Default)]
struct LogInner {
    executions: Vec<Execution>,
    running: usize,
    peak: usize,
}

/// Shared record of every execution a [`ScriptedExecutor`] performed.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    inner: Arc<Mutex<LogInner>>,
}

impl ExecutionLog {
    fn begin(&self, unit: &ScheduledUnit) -> RunningGuard {
        let mut inner = self.inner.lock().unwrap();
        inner.executions.push(Execution {
            unit: unit.name.clone(),
            start_tick: unit.start_tick,
            started: Instant::now(),
            finished: None,
            outcome: None,
        });
        inner.running += 1;
        inner.peak = inner.peak.max(inner.running);
        RunningGuard {
            log: self.clone(),
            idx: inner.executions.len() - 1,
        }
    }

    pub fn executions(&self) -> Vec<Execution> {
        self.inner.lock().unwrap().executions.clone()
    }

    /// Unit names in the order they were started.
    pub fn started(&self) -> Vec<String> {
        self.executions().into_iter().map(|e| e.unit).collect()
    }

    pub fn times_started(&self, unit: &str) -> usize {
        self.executions().iter().filter(|e| e.unit == unit).count()
    }

    pub fn get(&self, unit: &str) -> Option<Execution> {
        self.executions().into_iter().find(|e| e.unit == unit)
    }

    /// Highest number of units observed executing at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.inner.lock().unwrap().peak
    }

    /// Whether `a` and `b` were executing at the same time.
    pub fn overlapped(&self, a: &str, b: &str) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => {
                let a_end = a.finished.unwrap_or_else(Instant::now);
                let b_end = b.finished.unwrap_or_else(Instant::now);
                a.started < b_end && b.started < a_end
            }
            _ => false,
        }
    }
}

/// Decrements the running count even if the execution future is dropped.
struct RunningGuard {
    log: ExecutionLog,
    idx: usize,
}

impl RunningGuard {
    fn finish(&self, outcome: &UnitOutcome) {
        let mut inner = self.log.inner.lock().unwrap();
        let exec = &mut inner.executions[self.idx];
        exec.finished = Some(Instant::now());
        exec.outcome = Some(outcome.clone());
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.log.inner.lock() {
            inner.running = inner.running.saturating_sub(1);
        }
    }
}

/// An executor that:
/// - sleeps for a scripted delay per unit
/// - resolves to a scripted outcome
/// - stops early with `Interrupted` when its token fires (unless stubborn)
/// - records every execution in an [`ExecutionLog`].
#[derive(Debug, Clone)]
pub struct ScriptedExecutor {
    scripts: Arc<HashMap<String, Script>>,
    default: Script,
    log: ExecutionLog,
}

impl ScriptedExecutor {
    /// Every unit passes after `delay` unless scripted otherwise.
    pub fn new(delay: Duration) -> Self {
        Self {
            scripts: Arc::new(HashMap::new()),
            default: Script::pass(delay),
            log: ExecutionLog::default(),
        }
    }

    pub fn script(mut self, unit: &str, script: Script) -> Self {
        Arc::make_mut(&mut self.scripts).insert(unit.to_string(), script);
        self
    }

    pub fn log(&self) -> ExecutionLog {
        self.log.clone()
    }
}

impl UnitExecutor for ScriptedExecutor {
    fn execute(&self, unit: ScheduledUnit, cancel: CancellationToken) -> UnitFuture {
        let script = self
            .scripts
            .get(&unit.name)
            .cloned()
            .unwrap_or_else(|| self.default.clone());
        let log = self.log.clone();

        Box::pin(async move {
            let guard = log.begin(&unit);

            let outcome = if script.ignore_cancel {
                tokio::time::sleep(script.delay).await;
                script.outcome
            } else {
                tokio::select! {
                    _ = tokio::time::sleep(script.delay) => script.outcome,
                    _ = cancel.cancelled() => UnitOutcome::Failed(FailureCause::Interrupted),
                }
            };

            guard.finish(&outcome);
            outcome
        })
    }
}
