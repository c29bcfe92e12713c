// src/engine/runtime.rs

use std::time::Duration;

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::reconcile::{CommitBatch, Reconciler};

/// External control signals for the poll runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    ShutdownRequested,
}

/// Drives `poll -> reconcile` on a fixed interval.
///
/// Cycles are single-flight by construction: this task is the only caller
/// of `Reconciler::cycle`, and a missed tick is skipped rather than burst.
/// Computed batches are handed to the commit executor; the runtime itself
/// never runs script side effects.
pub struct PollRuntime {
    reconciler: Reconciler,
    interval: Duration,
    control_rx: mpsc::Receiver<ControlEvent>,
    commit_tx: mpsc::Sender<CommitBatch>,
}

impl PollRuntime {
    pub fn new(
        reconciler: Reconciler,
        interval: Duration,
        control_rx: mpsc::Receiver<ControlEvent>,
        commit_tx: mpsc::Sender<CommitBatch>,
    ) -> Self {
        Self {
            reconciler,
            interval,
            control_rx,
            commit_tx,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        info!(interval = ?self.interval, "scriptwatch runtime started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let batch = self.reconciler.cycle();
                    if batch.is_empty() {
                        continue;
                    }

                    debug!(
                        runs = batch.run.len(),
                        terminates = batch.terminate.len(),
                        "handing batch to commit executor"
                    );
                    if self.commit_tx.send(batch).await.is_err() {
                        bail!("commit executor channel closed");
                    }
                }
                event = self.control_rx.recv() => {
                    match event {
                        Some(ControlEvent::ShutdownRequested) | None => {
                            info!("shutdown requested, stopping runtime");
                            break;
                        }
                    }
                }
            }
        }

        self.reconciler.shutdown();
        info!("scriptwatch runtime exiting");
        Ok(())
    }
}
