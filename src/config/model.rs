// src/config/model.rs

use std::collections::HashMap;

use serde::Deserialize;

use crate::config::context::ExecutionContext;
use crate::dag::{UnitName, UnitSpec};
use crate::report::OutputFormat;

/// Top-level manifest as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// concurrency = 4
/// timeout = "10m"
/// unit_timeout = "90s"
/// format = "text"
///
/// [[unit]]
/// name = "Login"
/// cmd = "./run-suite login"
///
/// [[unit]]
/// name = "Collection"
/// cmd = "./run-suite collection"
/// depends_on = ["Login"]
/// ```
///
/// Units are an array of tables rather than `[unit.<name>]` so that a
/// duplicated name reaches the graph builder instead of being a TOML error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawManifest {
    /// Run settings from `[config]`.
    #[serde(default)]
    pub config: RunSection,

    /// All units from `[[unit]]`, in declaration order.
    #[serde(default)]
    pub unit: Vec<UnitConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    /// Maximum number of units running at once. Must be >= 1.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Overall run timeout, e.g. `"10m"`.
    #[serde(default)]
    pub timeout: Option<String>,

    /// Per-unit timeout, e.g. `"90s"`.
    #[serde(default)]
    pub unit_timeout: Option<String>,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Kill running units when the run is cancelled instead of letting them
    /// finish.
    #[serde(default)]
    pub hard_cancel: bool,
}

fn default_concurrency() -> usize {
    1
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout: None,
            unit_timeout: None,
            format: OutputFormat::default(),
            hard_cancel: false,
        }
    }
}

/// One `[[unit]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitConfig {
    /// Unique unit identity.
    pub name: String,

    /// The command to execute.
    pub cmd: String,

    /// Units that must pass before this one starts.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// A manifest whose settings have been checked.
///
/// Obtained through `Manifest::try_from(RawManifest)`; see
/// [`validate`](crate::config::validate). The unit *graph* is validated
/// separately by [`DagGraph::build`](crate::dag::DagGraph::build).
#[derive(Debug, Clone)]
pub struct Manifest {
    context: ExecutionContext,
    units: Vec<UnitConfig>,
}

impl Manifest {
    pub(crate) fn new_unchecked(context: ExecutionContext, units: Vec<UnitConfig>) -> Self {
        Self { context, units }
    }

    /// Run settings declared in the manifest.
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn units(&self) -> &[UnitConfig] {
        &self.units
    }

    /// Descriptors for the graph builder, in declaration order.
    pub fn unit_specs(&self) -> Vec<UnitSpec> {
        self.units
            .iter()
            .map(|u| UnitSpec {
                name: u.name.clone(),
                prerequisites: u.depends_on.iter().cloned().collect(),
            })
            .collect()
    }

    /// Command line per unit, for the shell executor.
    pub fn commands(&self) -> HashMap<UnitName, String> {
        self.units
            .iter()
            .map(|u| (u.name.clone(), u.cmd.clone()))
            .collect()
    }
}
