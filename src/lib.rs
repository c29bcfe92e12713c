// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod reconcile;
pub mod script;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::info;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{spawn_executor, ControlEvent, ExecutionEngine, PollRuntime, ProcessEngine};
use crate::fs::{RealFs, ScriptFs};
use crate::reconcile::Reconciler;
use crate::watch::NotifyWatch;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the process engine and commit executor
/// - the reconciler and its notify-backed watch
/// - startup preload
/// - the poll runtime and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let root = script_root(&config_path, &cfg.config.script_dir);
    std::fs::create_dir_all(&root)
        .with_context(|| format!("creating script directory {:?}", root))?;

    let engine: Arc<dyn ExecutionEngine> = Arc::new(ProcessEngine::new(&cfg.engine)?);
    let script_fs: Arc<dyn ScriptFs> = Arc::new(RealFs);
    let watch = NotifyWatch::new(&root, &cfg.watch.exclude)?;

    let reconciler = Reconciler::new(&root, Arc::clone(&engine), script_fs, Box::new(watch));

    let initial: Vec<PathBuf> = cfg.watch.paths.iter().map(PathBuf::from).collect();
    info!(paths = ?initial, root = ?root, "initial watched paths");
    reconciler.watch_all(&initial);

    // Resolve load-order chains before the poll loop starts.
    reconciler.preload();

    if args.once {
        reconciler.shutdown();
        return Ok(());
    }

    let commit_tx = spawn_executor(Arc::clone(&engine));

    // Ctrl-C -> graceful shutdown.
    let (control_tx, control_rx) = mpsc::channel::<ControlEvent>(4);
    {
        let tx = control_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(ControlEvent::ShutdownRequested).await;
        });
    }

    let runtime = PollRuntime::new(
        reconciler,
        Duration::from_millis(cfg.config.poll_interval_ms),
        control_rx,
        commit_tx,
    );
    runtime.run().await
}

/// Script root: `script_dir` resolved against the config file's directory.
fn script_root(config_path: &Path, script_dir: &str) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
        .join(script_dir)
}

/// Simple dry-run output: print the effective configuration.
fn print_dry_run(cfg: &ConfigFile) {
    println!("scriptwatch dry-run");
    println!("  config.poll_interval_ms = {}", cfg.config.poll_interval_ms);
    println!("  config.script_dir = {}", cfg.config.script_dir);
    match &cfg.engine.interpreter {
        Some(interpreter) => {
            println!("  engine.interpreter = {interpreter}");
            if !cfg.engine.args.is_empty() {
                println!("  engine.args = {:?}", cfg.engine.args);
            }
        }
        None => println!("  engine.interpreter = (none, scripts run directly)"),
    }
    println!();

    println!("watched paths ({}):", cfg.watch.paths.len());
    for path in cfg.watch.paths.iter() {
        println!("  - {path}");
    }
    if !cfg.watch.exclude.is_empty() {
        println!("event excludes: {:?}", cfg.watch.exclude);
    }
}
