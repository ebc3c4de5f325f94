// src/exec/shell.rs

//! Shell command executor: each unit is a command run through the platform
//! shell, and its exit status decides the outcome.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dag::{FailureCause, ScheduledUnit, UnitName};
use crate::engine::UnitOutcome;
use crate::exec::backend::{UnitExecutor, UnitFuture};

/// Runs unit commands with `sh -c` (or `cmd /C` on Windows).
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    commands: Arc<HashMap<UnitName, String>>,
    workdir: Option<PathBuf>,
}

impl ShellExecutor {
    pub fn new(commands: HashMap<UnitName, String>) -> Self {
        Self {
            commands: Arc::new(commands),
            workdir: None,
        }
    }

    /// Run every command from `dir` instead of the current directory.
    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }
}

impl UnitExecutor for ShellExecutor {
    fn execute(&self, unit: ScheduledUnit, cancel: CancellationToken) -> UnitFuture {
        let cmd = self.commands.get(&unit.name).cloned();
        let workdir = self.workdir.clone();

        Box::pin(async move {
            let Some(cmd) = cmd else {
                error!(unit = %unit.name, "no command configured for unit");
                return UnitOutcome::Failed(FailureCause::error(format!(
                    "no command configured for unit '{}'",
                    unit.name
                )));
            };

            match run_command(&unit, &cmd, workdir, cancel).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(unit = %unit.name, error = %err, "unit execution error");
                    UnitOutcome::Failed(FailureCause::error(format!("{err:#}")))
                }
            }
        })
    }
}

async fn run_command(
    unit: &ScheduledUnit,
    cmd_line: &str,
    workdir: Option<PathBuf>,
    cancel: CancellationToken,
) -> Result<UnitOutcome> {
    info!(unit = %unit.name, cmd = %cmd_line, "starting unit process");

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd_line);
        c
    };

    if let Some(dir) = workdir {
        cmd.current_dir(dir);
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for unit '{}'", unit.name))?;

    // Always drain both pipes so buffers don't fill; forward at debug.
    if let Some(stdout) = child.stdout.take() {
        let name = unit.name.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(unit = %name, "stdout: {}", line);
            }
        });
    }
    if let Some(stderr) = child.stderr.take() {
        let name = unit.name.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(unit = %name, "stderr: {}", line);
            }
        });
    }

    tokio::select! {
        status = child.wait() => {
            let status = status
                .with_context(|| format!("waiting for process of unit '{}'", unit.name))?;
            let code = status.code().unwrap_or(-1);

            info!(
                unit = %unit.name,
                exit_code = code,
                success = status.success(),
                "unit process exited"
            );

            if status.success() {
                Ok(UnitOutcome::Passed)
            } else {
                Ok(UnitOutcome::Failed(FailureCause::ExitCode { code }))
            }
        }

        _ = cancel.cancelled() => {
            info!(unit = %unit.name, "stop requested; killing unit process");
            if let Err(e) = child.kill().await {
                warn!(unit = %unit.name, error = %e, "failed to kill unit process");
            }
            Ok(UnitOutcome::Failed(FailureCause::Interrupted))
        }
    }
}
