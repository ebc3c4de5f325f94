// src/config/mod.rs

//! Manifest loading and run settings.
//!
//! Responsibilities:
//! - Define the TOML-backed manifest model (`model.rs`).
//! - Load a manifest from disk (`loader.rs`).
//! - Check settings and per-unit fields (`validate.rs`).
//! - Hold the per-run [`ExecutionContext`] (`context.rs`).

pub mod context;
pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use context::{ContextOverrides, ExecutionContext};
pub use duration::parse_duration;
pub use loader::{default_manifest_path, load_and_validate, load_from_path, manifest_root_dir};
pub use model::{Manifest, RawManifest, RunSection, UnitConfig};
