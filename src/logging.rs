// src/logging.rs

//! Logging setup for `scriptwatch` using `tracing` + `tracing-subscriber`.
//!
//! Filter resolution:
//! 1. `--log-level` CLI flag (a single global level)
//! 2. `SCRIPTWATCH_LOG` environment variable, which accepts full
//!    `EnvFilter` directives (e.g. "debug" or
//!    "scriptwatch::reconcile=trace,info")
//! 3. default to `info`

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Resolve the filter directives from the CLI flag and the environment.
///
/// The CLI flag is a plain level and always wins; the environment value is
/// passed through untouched so per-module directives work.
pub fn filter_directives(cli_level: Option<LogLevel>, env: Option<String>) -> String {
    match cli_level {
        Some(lvl) => directive(lvl).to_string(),
        None => match env {
            Some(s) if !s.trim().is_empty() => s,
            _ => "info".to_string(),
        },
    }
}

/// Initialise the global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let directives = filter_directives(cli_level, std::env::var("SCRIPTWATCH_LOG").ok());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|err| {
        eprintln!("invalid SCRIPTWATCH_LOG filter '{directives}': {err}");
        EnvFilter::new("info")
    });

    // `init()` panics if called twice; we only call once in main.
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}

fn directive(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
