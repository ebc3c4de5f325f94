// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{default_manifest_path, parse_duration, ContextOverrides};
use crate::report::OutputFormat;

/// Command-line arguments for `testdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "testdag",
    version,
    about = "Run test units in dependency order, as parallel as the graph allows.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TESTDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Validate the manifest and run every unit.
    Run(RunArgs),
    /// Validate the manifest and print the execution plan without running
    /// anything.
    Check(CheckArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Path to the unit manifest (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_manifest_path())]
    pub manifest: PathBuf,

    /// Maximum number of units running at once.
    #[arg(long, short = 'j', value_name = "N", value_parser = parse_concurrency)]
    pub concurrency: Option<usize>,

    /// Overall run timeout (e.g. "10m"). Units not started by then are skipped.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Per-unit timeout (e.g. "90s"). A unit exceeding it fails.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub unit_timeout: Option<Duration>,

    /// Report format.
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Run only this unit and everything it depends on. Repeatable.
    #[arg(long = "unit", value_name = "NAME")]
    pub units: Vec<String>,

    /// Kill running units on cancellation instead of letting them finish.
    #[arg(long)]
    pub hard_cancel: bool,
}

impl RunArgs {
    /// Settings given on the command line, to layer over the manifest.
    pub fn overrides(&self) -> ContextOverrides {
        ContextOverrides {
            concurrency: self.concurrency,
            timeout: self.timeout,
            unit_timeout: self.unit_timeout,
            format: self.format,
            hard_cancel: self.hard_cancel,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// Path to the unit manifest (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_manifest_path())]
    pub manifest: PathBuf,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_concurrency(s: &str) -> Result<usize, String> {
    let n: usize = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid concurrency '{s}': {e}"))?;
    if n == 0 {
        return Err("concurrency must be >= 1".to_string());
    }
    Ok(n)
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
