// src/config/validate.rs

use std::time::Duration;

use crate::config::context::ExecutionContext;
use crate::config::duration::parse_duration;
use crate::config::model::{Manifest, RawManifest};
use crate::errors::{Result, TestdagError};

impl TryFrom<RawManifest> for Manifest {
    type Error = TestdagError;

    fn try_from(raw: RawManifest) -> std::result::Result<Self, Self::Error> {
        let context = validate_run_section(&raw)?;
        validate_units(&raw)?;
        Ok(Manifest::new_unchecked(context, raw.unit))
    }
}

/// Check `[config]` and turn it into an [`ExecutionContext`].
fn validate_run_section(raw: &RawManifest) -> Result<ExecutionContext> {
    let cfg = &raw.config;

    if cfg.concurrency == 0 {
        return Err(TestdagError::ConfigError(
            "[config].concurrency must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(ExecutionContext {
        concurrency: cfg.concurrency,
        timeout: parse_optional_duration("timeout", cfg.timeout.as_deref())?,
        unit_timeout: parse_optional_duration("unit_timeout", cfg.unit_timeout.as_deref())?,
        format: cfg.format,
        hard_cancel: cfg.hard_cancel,
    })
}

fn parse_optional_duration(field: &str, value: Option<&str>) -> Result<Option<Duration>> {
    value
        .map(|s| {
            parse_duration(s).map_err(|e| {
                TestdagError::ConfigError(format!("invalid [config].{field}: {e}"))
            })
        })
        .transpose()
}

/// Field-level checks only. Duplicates, unknown dependencies and cycles are
/// the graph builder's job.
fn validate_units(raw: &RawManifest) -> Result<()> {
    for (idx, unit) in raw.unit.iter().enumerate() {
        if unit.name.trim().is_empty() {
            return Err(TestdagError::ConfigError(format!(
                "unit #{} has an empty name",
                idx + 1
            )));
        }
        if unit.cmd.trim().is_empty() {
            return Err(TestdagError::ConfigError(format!(
                "unit '{}' has an empty `cmd`",
                unit.name
            )));
        }
        if let Some(dep) = unit.depends_on.iter().find(|d| d.trim().is_empty()) {
            return Err(TestdagError::ConfigError(format!(
                "unit '{}' has an empty entry '{}' in `depends_on`",
                unit.name, dep
            )));
        }
    }
    Ok(())
}
