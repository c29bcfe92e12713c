// src/watch/mock.rs

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::errors::{Result, ScriptwatchError};
use crate::watch::watcher::{FileEvent, WatchBackend};

#[derive(Debug, Default)]
struct ScriptedWatchInner {
    batches: VecDeque<Vec<FileEvent>>,
    polls: usize,
    rearms: usize,
    failing_rearms: usize,
}

/// Scripted watch backend for tests.
///
/// Clones share state, so a test can hand one clone to the reconciler and
/// keep queueing event batches through another. Each `poll` pops one
/// pre-queued batch (or returns an empty one), and every `rearm` is counted
/// so tests can assert the poll/rearm pairing.
#[derive(Debug, Clone, Default)]
pub struct ScriptedWatch {
    inner: Arc<Mutex<ScriptedWatchInner>>,
}

impl ScriptedWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a batch of events to be returned by the next unconsumed poll.
    pub fn push_batch(&self, events: Vec<FileEvent>) {
        self.inner.lock().unwrap().batches.push_back(events);
    }

    /// Make the next `n` calls to `rearm` fail.
    pub fn fail_next_rearms(&self, n: usize) {
        self.inner.lock().unwrap().failing_rearms = n;
    }

    pub fn polls(&self) -> usize {
        self.inner.lock().unwrap().polls
    }

    pub fn rearms(&self) -> usize {
        self.inner.lock().unwrap().rearms
    }
}

impl WatchBackend for ScriptedWatch {
    fn poll(&mut self) -> Vec<FileEvent> {
        let mut inner = self.inner.lock().unwrap();
        inner.polls += 1;
        inner.batches.pop_front().unwrap_or_default()
    }

    fn rearm(&mut self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.rearms += 1;
        if inner.failing_rearms > 0 {
            inner.failing_rearms -= 1;
            return Err(ScriptwatchError::Watch(
                "scripted rearm failure".to_string(),
            ));
        }
        Ok(())
    }
}
