// src/engine/mod.rs

//! Execution engine integration.
//!
//! The reconciler does not know what language or interpreter runs a script;
//! it only hands [`crate::reconcile::CommitBatch`]es to this layer:
//!
//! - [`ExecutionEngine`] is the contract an engine implements.
//! - [`executor`] owns the commit loop: a single task that applies batches,
//!   all runs before any terminate.
//! - [`process`] is the engine used by the CLI: each script file runs as a
//!   child process.
//! - [`runtime`] drives `poll -> reconcile` on a fixed interval.

pub mod executor;
pub mod process;
pub mod runtime;

use std::path::Path;

use anyhow::Result;

use crate::script::ScriptContext;

pub use executor::{apply_batch, spawn_executor};
pub use process::ProcessEngine;
pub use runtime::{ControlEvent, PollRuntime};

/// Contract between the reconciler and whatever executes scripts.
pub trait ExecutionEngine: Send + Sync {
    /// Begin executing a script. Called exactly once per instance, after
    /// registration. Errors are reported to the caller, which logs them;
    /// the instance stays registered either way.
    fn execute(&self, script: &ScriptContext) -> Result<()>;

    /// Release any engine-side context held for a script path. Called when
    /// an instance for that path is terminated. Must not fail; engines log
    /// their own cleanup problems.
    fn release_context(&self, path: &Path);
}
