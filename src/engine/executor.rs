// src/engine/executor.rs

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::engine::ExecutionEngine;
use crate::reconcile::CommitBatch;

/// Spawn the background commit loop.
///
/// The returned sender is the hand-off point for the poll runtime: batches
/// are applied by this single task, which serializes all script side
/// effects onto one execution context.
pub fn spawn_executor(engine: Arc<dyn ExecutionEngine>) -> mpsc::Sender<CommitBatch> {
    let (tx, mut rx) = mpsc::channel::<CommitBatch>(32);

    tokio::spawn(async move {
        info!("commit executor started");
        while let Some(batch) = rx.recv().await {
            apply_batch(engine.as_ref(), batch);
        }
        info!("commit executor finished (channel closed)");
    });

    tx
}

/// Apply one batch: every `run` before any `terminate`.
///
/// During a reload this guarantees the replacement is already active before
/// the predecessor's resources are released. Failures on either side are
/// per-instance: one failing script never blocks the rest of the batch.
pub fn apply_batch(engine: &dyn ExecutionEngine, batch: CommitBatch) {
    for ctx in &batch.run {
        debug!(script = %ctx.name(), path = %ctx.path().display(), "running script");
        if let Err(err) = engine.execute(ctx) {
            error!(
                script = %ctx.name(),
                path = %ctx.path().display(),
                error = %err,
                "script failed to run"
            );
        }
    }

    for instance in &batch.terminate {
        debug!(script = %instance.name(), "terminating script");
        engine.release_context(instance.path());
        instance.terminate();
    }
}
