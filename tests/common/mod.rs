// tests/common/mod.rs

//! Shared test fixtures: an in-memory harness around the reconciler and a
//! recording fake engine.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;

use scriptwatch::engine::ExecutionEngine;
use scriptwatch::fs::MemFs;
use scriptwatch::reconcile::Reconciler;
use scriptwatch::script::ScriptContext;
use scriptwatch::watch::ScriptedWatch;

type ExecuteHook = Box<dyn Fn(&ScriptContext) -> Result<()> + Send + Sync>;

/// Fake engine that records every `execute`/`release_context` call in
/// order, and optionally runs a per-path hook on execute (to simulate a
/// script body declaring dependencies, watching paths, or failing).
#[derive(Default)]
pub struct RecordingEngine {
    events: Mutex<Vec<String>>,
    hooks: Mutex<HashMap<PathBuf, ExecuteHook>>,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on_execute(
        &self,
        path: impl Into<PathBuf>,
        hook: impl Fn(&ScriptContext) -> Result<()> + Send + Sync + 'static,
    ) {
        self.hooks
            .lock()
            .unwrap()
            .insert(path.into(), Box::new(hook));
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn push_event(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }
}

impl ExecutionEngine for RecordingEngine {
    fn execute(&self, script: &ScriptContext) -> Result<()> {
        self.push_event(format!("run:{}", script.path().display()));

        let hooks = self.hooks.lock().unwrap();
        if let Some(hook) = hooks.get(script.path()) {
            return hook(script);
        }
        Ok(())
    }

    fn release_context(&self, path: &Path) {
        self.push_event(format!("release:{}", path.display()));
    }
}

/// Everything a test needs: shared handles to the fake filesystem, fake
/// watch and engine, plus the reconciler wired to them.
pub struct Harness {
    pub fs: MemFs,
    pub watch: ScriptedWatch,
    pub engine: Arc<RecordingEngine>,
    pub reconciler: Reconciler,
}

pub const ROOT: &str = "scripts";

pub fn harness() -> Harness {
    let fs = MemFs::new();
    let watch = ScriptedWatch::new();
    let engine = RecordingEngine::new();

    let engine_dyn: Arc<dyn ExecutionEngine> = engine.clone();
    let reconciler = Reconciler::new(
        ROOT,
        engine_dyn,
        Arc::new(fs.clone()),
        Box::new(watch.clone()),
    );

    Harness {
        fs,
        watch,
        engine,
        reconciler,
    }
}

impl Harness {
    /// Absolute path (from the harness root) for a script-relative path.
    pub fn abs(&self, rel: &str) -> PathBuf {
        Path::new(ROOT).join(rel)
    }

    pub fn add_script(&self, rel: &str, content: &str) {
        self.fs.add_file(self.abs(rel), content);
    }

    pub fn remove_script(&self, rel: &str) {
        self.fs.remove_file(self.abs(rel));
    }

    pub fn watch_path(&self, rel: &str) {
        self.reconciler.watch_all(&[PathBuf::from(rel)]);
    }

    pub fn unwatch_path(&self, rel: &str) {
        self.reconciler.unwatch_all(&[PathBuf::from(rel)]);
    }

    /// Run one cycle and apply the batch inline, like the commit executor
    /// would.
    pub fn cycle_and_commit(&self) {
        let batch = self.reconciler.cycle();
        scriptwatch::engine::apply_batch(self.engine.as_ref(), batch);
    }
}
