// src/dag/cause.rs

//! Why a unit ended up `Failed` or `Skipped`.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::dag::UnitName;

/// Reason a unit failed. Reported by the executor, or by the runtime for
/// timeouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureCause {
    /// Process exited with a non-zero status.
    ExitCode { code: i32 },
    /// The unit could not be executed at all (spawn error etc).
    Error { message: String },
    /// The per-unit timeout elapsed.
    Timeout { after_ms: u64 },
    /// Stopped by a hard cancellation signal.
    Interrupted,
}

impl FailureCause {
    pub fn timeout(after: Duration) -> Self {
        FailureCause::Timeout {
            after_ms: after.as_millis() as u64,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        FailureCause::Error {
            message: message.into(),
        }
    }
}

/// Why a run stopped dispatching units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The overall run timeout elapsed.
    RunTimeout,
    /// Cancellation was requested from outside (e.g. Ctrl-C).
    Requested,
}

/// Reason a unit never ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipCause {
    /// The named ancestor failed first.
    DependencyFailed { unit: UnitName },
    Cancelled { reason: CancelReason },
}

/// Cause attached to a non-passing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cause {
    Failed(FailureCause),
    Skipped(SkipCause),
}

impl Cause {
    /// The failed ancestor for dependency skips.
    pub fn failed_ancestor(&self) -> Option<&str> {
        match self {
            Cause::Skipped(SkipCause::DependencyFailed { unit }) => Some(unit),
            _ => None,
        }
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::ExitCode { code } => write!(f, "exited with code {code}"),
            FailureCause::Error { message } => write!(f, "error: {message}"),
            FailureCause::Timeout { after_ms } => write!(f, "timed out after {after_ms} ms"),
            FailureCause::Interrupted => f.write_str("interrupted"),
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::RunTimeout => f.write_str("run timeout"),
            CancelReason::Requested => f.write_str("cancellation requested"),
        }
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cause::Failed(cause) => cause.fmt(f),
            Cause::Skipped(SkipCause::DependencyFailed { unit }) => {
                write!(f, "dependency '{unit}' failed")
            }
            Cause::Skipped(SkipCause::Cancelled { reason }) => {
                write!(f, "cancelled ({reason})")
            }
        }
    }
}
