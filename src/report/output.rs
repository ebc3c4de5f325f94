// src/report/output.rs

//! Report sinks: human-readable text or JSON for CI ingestion.
//!
//! Everything the run prints goes through [`ReportWriter`], which picks the
//! format. The unit-level logic never deals with formatting.

use std::collections::BTreeMap;
use std::io::Write;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::dag::{Cause, UnitState};
use crate::errors::Result;
use crate::report::summary::{RunStatus, Summary};

/// Supported report formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line per unit plus a summary line.
    #[default]
    Text,
    /// A single JSON document.
    Json,
}

/// Human-readable rendering, implemented alongside `Serialize` for payloads.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

/// Writes payloads in the configured format.
#[derive(Debug, Clone, Copy)]
pub struct ReportWriter {
    format: OutputFormat,
}

impl ReportWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn write<T: Render + Serialize>(&self, payload: &T, w: &mut dyn Write) -> Result<()> {
        match self.format {
            OutputFormat::Text => payload.render_text(w)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        w.flush()?;
        Ok(())
    }

    /// Render a summary to stdout.
    pub fn emit(&self, summary: &Summary) -> Result<()> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.write(&JsonReport::from(summary), &mut handle)
    }
}

/// Machine-readable report layout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonReport {
    pub units: BTreeMap<String, JsonUnit>,
    pub summary: JsonSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonUnit {
    pub state: UnitState,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Cause>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_duration_ms: u64,
    pub status: RunStatus,
}

impl From<&Summary> for JsonReport {
    fn from(summary: &Summary) -> Self {
        let units = summary
            .units
            .iter()
            .map(|u| {
                (
                    u.name.clone(),
                    JsonUnit {
                        state: u.state,
                        duration_ms: u.duration.as_millis() as u64,
                        cause: u.cause.clone(),
                    },
                )
            })
            .collect();

        Self {
            units,
            summary: JsonSummary {
                passed: summary.passed,
                failed: summary.failed,
                skipped: summary.skipped,
                total_duration_ms: summary.total_duration.as_millis() as u64,
                status: summary.status,
            },
        }
    }
}

impl Render for JsonReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        for (name, unit) in &self.units {
            let label = match unit.state {
                UnitState::Passed => "PASS",
                UnitState::Failed => "FAIL",
                UnitState::Skipped => "SKIP",
                _ => "????",
            };
            match &unit.cause {
                Some(cause) => writeln!(w, "{label}  {name} ({cause})")?,
                None => writeln!(w, "{label}  {name} ({} ms)", unit.duration_ms)?,
            }
        }

        let s = &self.summary;
        writeln!(w)?;
        writeln!(
            w,
            "{} passed, {} failed, {} skipped in {} ms: {}",
            s.passed,
            s.failed,
            s.skipped,
            s.total_duration_ms,
            match s.status {
                RunStatus::Passed => "ok",
                RunStatus::Failed => "FAILED",
                RunStatus::Incomplete => "INCOMPLETE",
            }
        )
    }
}
