// src/exec/mod.rs

//! Unit execution layer.
//!
//! - [`backend`] defines the `UnitExecutor` trait the runtime drives.
//! - [`shell`] runs each unit as a shell command via `tokio::process`.

pub mod backend;
pub mod shell;

pub use backend::{UnitExecutor, UnitFuture};
pub use shell::ShellExecutor;
