// src/report/mod.rs

//! Run results and reporting.
//!
//! - [`collector`] assembles per-unit records while the run progresses.
//! - [`summary`] aggregates a finished run and decides the exit status.
//! - [`output`] renders the summary as text or JSON.

pub mod collector;
pub mod output;
pub mod summary;

pub use collector::{ReportCollector, RunResult, UnitRecord};
pub use output::{JsonReport, OutputFormat, Render, ReportWriter};
pub use summary::{RunStatus, Summary, UnitSummary};
