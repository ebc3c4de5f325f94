// src/errors.rs

//! Crate-wide error types.
//!
//! Validation problems with the unit graph are kept in their own enum so that
//! callers can tell "nothing ran because the graph is broken" apart from
//! everything else. Unit failures are never errors here: they are recorded in
//! the run report.

use thiserror::Error;

use crate::dag::UnitName;

/// Exit code used for any error detected before a unit starts running.
pub const EXIT_PRE_EXECUTION: i32 = 2;

/// The unit graph cannot be executed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("duplicate unit '{name}'")]
    DuplicateUnit { name: UnitName },

    #[error("unit '{unit}' depends on unknown unit '{missing}'")]
    UnknownDependency { unit: UnitName, missing: UnitName },

    #[error("cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<UnitName> },

    #[error("no unit named '{name}' to select")]
    UnknownUnit { name: UnitName },
}

#[derive(Error, Debug)]
pub enum TestdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TestdagError {
    /// Process exit code for this error.
    ///
    /// Manifest and graph problems are detected before any unit runs and map
    /// to [`EXIT_PRE_EXECUTION`]; anything else (e.g. the report sink failing)
    /// is a plain failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            TestdagError::ConfigError(_)
            | TestdagError::Validation(_)
            | TestdagError::TomlError(_) => EXIT_PRE_EXECUTION,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, TestdagError>;
