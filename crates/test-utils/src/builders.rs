#![allow(dead_code)]

use std::collections::BTreeSet;

use testdag::config::{Manifest, RawManifest, RunSection, UnitConfig};
use testdag::dag::{DagGraph, UnitSpec};

/// Builder for `Manifest` to simplify test setup.
pub struct ManifestBuilder {
    manifest: RawManifest,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self {
            manifest: RawManifest {
                config: RunSection::default(),
                unit: Vec::new(),
            },
        }
    }

    pub fn with_unit(mut self, unit: UnitConfig) -> Self {
        self.manifest.unit.push(unit);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.manifest.config.concurrency = n;
        self
    }

    pub fn timeout(mut self, value: &str) -> Self {
        self.manifest.config.timeout = Some(value.to_string());
        self
    }

    pub fn unit_timeout(mut self, value: &str) -> Self {
        self.manifest.config.unit_timeout = Some(value.to_string());
        self
    }

    pub fn hard_cancel(mut self, val: bool) -> Self {
        self.manifest.config.hard_cancel = val;
        self
    }

    pub fn raw(self) -> RawManifest {
        self.manifest
    }

    pub fn build(self) -> Manifest {
        Manifest::try_from(self.manifest).expect("Failed to build valid manifest from builder")
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `UnitConfig`.
pub struct UnitBuilder {
    unit: UnitConfig,
}

impl UnitBuilder {
    pub fn new(name: &str, cmd: &str) -> Self {
        Self {
            unit: UnitConfig {
                name: name.to_string(),
                cmd: cmd.to_string(),
                depends_on: vec![],
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.unit.depends_on.push(dep.to_string());
        self
    }

    pub fn build(self) -> UnitConfig {
        self.unit
    }
}

/// Shorthand for graph tests: `spec("C", &["A", "B"])`.
pub fn spec(name: &str, deps: &[&str]) -> UnitSpec {
    UnitSpec {
        name: name.to_string(),
        prerequisites: deps.iter().map(|d| d.to_string()).collect::<BTreeSet<_>>(),
    }
}

/// Build a graph from `(name, deps)` pairs, panicking on invalid input.
pub fn graph(units: &[(&str, &[&str])]) -> DagGraph {
    let specs: Vec<UnitSpec> = units.iter().map(|(n, d)| spec(n, d)).collect();
    DagGraph::build(&specs).expect("test graph should be valid")
}
