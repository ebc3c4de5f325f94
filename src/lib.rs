// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod report;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::{CheckArgs, CliArgs, Command, RunArgs};
use crate::config::{load_and_validate, manifest_root_dir, Manifest};
use crate::dag::DagGraph;
use crate::errors::Result;
use crate::exec::ShellExecutor;
use crate::report::{ReportWriter, Summary};

/// High-level entry point used by `main.rs`.
///
/// Returns the process exit code for a completed command. Errors are
/// detected before any unit runs; see [`errors::TestdagError::exit_code`].
pub async fn run(args: CliArgs) -> Result<i32> {
    match args.command {
        Command::Run(run_args) => run_command(run_args).await,
        Command::Check(check_args) => check_command(check_args),
    }
}

async fn run_command(args: RunArgs) -> Result<i32> {
    let manifest = load_and_validate(&args.manifest)?;
    let ctx = manifest.context().clone().apply(&args.overrides());
    let graph = build_graph(&manifest, &args.units)?;

    info!(
        units = graph.len(),
        concurrency = ctx.concurrency,
        timeout = ?ctx.timeout,
        unit_timeout = ?ctx.unit_timeout,
        "manifest loaded"
    );

    let executor =
        ShellExecutor::new(manifest.commands()).with_workdir(manifest_root_dir(&args.manifest));

    // Ctrl-C → stop dispatching and drain.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received; cancelling run");
            cancel.cancel();
        });
    }

    let result = engine::run_units(Arc::new(graph), executor, &ctx, cancel).await?;
    let summary = Summary::finalize(&result);

    ReportWriter::new(ctx.format).emit(&summary)?;

    debug!(status = ?summary.status, "run complete");
    Ok(summary.exit_code())
}

fn check_command(args: CheckArgs) -> Result<i32> {
    let manifest = load_and_validate(&args.manifest)?;
    let graph = build_graph(&manifest, &[])?;
    print_plan(&args.manifest, &manifest, &graph);
    Ok(0)
}

/// Build and validate the unit graph, narrowed to `selected` units (and their
/// prerequisites) when any are given.
fn build_graph(manifest: &Manifest, selected: &[String]) -> Result<DagGraph> {
    let graph = DagGraph::build(&manifest.unit_specs())?;
    if selected.is_empty() {
        return Ok(graph);
    }
    let narrowed = graph.select(selected)?;
    debug!(selected = ?selected, units = narrowed.len(), "narrowed unit graph");
    Ok(narrowed)
}

/// Print units grouped by dependency depth: everything in a wave can run in
/// parallel once the previous waves have passed.
fn print_plan(path: &Path, manifest: &Manifest, graph: &DagGraph) {
    let ctx = manifest.context();
    println!("testdag check: {}", path.display());
    println!("  config.concurrency = {}", ctx.concurrency);
    if let Some(t) = ctx.timeout {
        println!("  config.timeout = {t:?}");
    }
    if let Some(t) = ctx.unit_timeout {
        println!("  config.unit_timeout = {t:?}");
    }
    println!();

    let waves = waves(graph);
    println!("units ({}) in {} wave(s):", graph.len(), waves.len());
    for (idx, wave) in waves.iter().enumerate() {
        println!("  wave {}:", idx + 1);
        for name in wave {
            let deps = graph.dependencies_of(name);
            if deps.is_empty() {
                println!("    - {name}");
            } else {
                println!("    - {name} (after: {})", deps.join(", "));
            }
        }
    }

    debug!("check complete (no execution)");
}

/// Group units by the length of their longest prerequisite chain.
fn waves(graph: &DagGraph) -> Vec<Vec<String>> {
    let mut depth: BTreeMap<&str, usize> = BTreeMap::new();

    // The graph is acyclic, so each pass settles at least one more unit.
    while depth.len() < graph.len() {
        for name in graph.units() {
            if depth.contains_key(name) {
                continue;
            }
            let deps = graph.dependencies_of(name);
            if deps.iter().all(|d| depth.contains_key(d.as_str())) {
                let level = deps
                    .iter()
                    .filter_map(|d| depth.get(d.as_str()))
                    .map(|l| l + 1)
                    .max()
                    .unwrap_or(0);
                depth.insert(name, level);
            }
        }
    }

    let mut waves: Vec<Vec<String>> = Vec::new();
    for (name, level) in depth {
        if waves.len() <= level {
            waves.resize_with(level + 1, Vec::new);
        }
        waves[level].push(name.to_string());
    }
    waves
}
