// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{Manifest, RawManifest};
use crate::errors::{Result, TestdagError};

/// Load a manifest file from a given path and return the raw `RawManifest`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawManifest> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        TestdagError::ConfigError(format!("reading manifest at {}: {e}", path.display()))
    })?;

    let manifest: RawManifest = toml::from_str(&contents)?;
    Ok(manifest)
}

/// Load a manifest from path and check its settings.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks concurrency, durations and per-unit fields.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Manifest> {
    let raw = load_from_path(&path)?;
    Manifest::try_from(raw)
}

/// Manifest location used when `--manifest` is not given.
pub fn default_manifest_path() -> PathBuf {
    PathBuf::from("Testdag.toml")
}

/// Directory unit commands run in: the manifest's parent, or the current
/// directory for a bare file name.
pub fn manifest_root_dir(manifest_path: &Path) -> PathBuf {
    match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
