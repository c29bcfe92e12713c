// src/reconcile/reconciler.rs

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, error, info};

use crate::engine::{apply_batch, ExecutionEngine};
use crate::fs::ScriptFs;
use crate::reconcile::depends::expand_reloads;
use crate::reconcile::plan::{compute_plan, ReconcilePlan};
use crate::script::{ScriptContext, ScriptInstance, ScriptRegistry};
use crate::watch::{DebounceCache, FileEvent, FileEventKind, WatchBackend};

/// Side effects one cycle hands off to the execution context.
///
/// Every `run` is executed before any `terminate`, so during a reload the
/// replacement is active before the predecessor's resources are released.
#[derive(Debug, Default)]
pub struct CommitBatch {
    pub run: Vec<ScriptContext>,
    pub terminate: Vec<Arc<ScriptInstance>>,
}

impl CommitBatch {
    pub fn is_empty(&self) -> bool {
        self.run.is_empty() && self.terminate.is_empty()
    }
}

/// Narrow handle through which scripts (and the host) mutate the watched
/// paths without holding the cycle lock for longer than the mutation
/// itself.
///
/// The watched paths are a multiset: two scripts watching the same path
/// account for two entries, and an unwatch removes one. A script's scoped
/// unwatch on terminate therefore never cancels the watch its replacement
/// instance just re-established.
#[derive(Clone)]
pub struct LoaderHandle {
    inner: Weak<ReconcilerInner>,
}

impl std::fmt::Debug for LoaderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderHandle").finish()
    }
}

impl LoaderHandle {
    pub fn watch_all(&self, paths: &[PathBuf]) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut state = inner.state.lock().unwrap();
        for path in paths {
            debug!(path = %path.display(), "watching path");
            state.watched.push(path.clone());
        }
    }

    pub fn unwatch_all(&self, paths: &[PathBuf]) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut state = inner.state.lock().unwrap();
        for path in paths {
            if let Some(pos) = state.watched.iter().position(|p| p == path) {
                debug!(path = %path.display(), "unwatching path");
                state.watched.remove(pos);
            }
        }
    }
}

struct ReconcilerState {
    watched: Vec<PathBuf>,
    registry: ScriptRegistry,
    watch: Box<dyn WatchBackend>,
    debounce: DebounceCache,
}

struct ReconcilerInner {
    root: PathBuf,
    fs: Arc<dyn ScriptFs>,
    engine: Arc<dyn ExecutionEngine>,
    state: Mutex<ReconcilerState>,
}

/// The control loop: consumes the watched-path set, the registry snapshot
/// and the latest filesystem events; computes what to load, unload and
/// reload; applies the plan in a fixed order.
///
/// Each reconciler owns its registry, watched-path set and watch backend;
/// independent reconcilers can coexist in one process.
#[derive(Clone)]
pub struct Reconciler {
    inner: Arc<ReconcilerInner>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("root", &self.inner.root)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(
        root: impl Into<PathBuf>,
        engine: Arc<dyn ExecutionEngine>,
        fs: Arc<dyn ScriptFs>,
        watch: Box<dyn WatchBackend>,
    ) -> Self {
        Self {
            inner: Arc::new(ReconcilerInner {
                root: root.into(),
                fs,
                engine,
                state: Mutex::new(ReconcilerState {
                    watched: Vec::new(),
                    registry: ScriptRegistry::new(),
                    watch,
                    debounce: DebounceCache::new(),
                }),
            }),
        }
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    pub fn loader_handle(&self) -> LoaderHandle {
        LoaderHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Add paths to the watched set.
    pub fn watch_all(&self, paths: &[PathBuf]) {
        self.loader_handle().watch_all(paths);
    }

    /// Remove paths from the watched set. The scripts loaded for them are
    /// unloaded on the next cycle.
    pub fn unwatch_all(&self, paths: &[PathBuf]) {
        self.loader_handle().unwatch_all(paths);
    }

    /// Snapshot of the watched paths, sorted and deduplicated.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        let state = self.inner.state.lock().unwrap();
        let mut paths: Vec<PathBuf> = state.watched.clone();
        paths.sort();
        paths.dedup();
        paths
    }

    /// Snapshot of the currently loaded script paths, sorted.
    pub fn loaded_paths(&self) -> Vec<PathBuf> {
        let state = self.inner.state.lock().unwrap();
        let mut paths = state.registry.paths();
        paths.sort();
        paths
    }

    /// Run one reconciliation cycle: poll, re-arm, plan, apply.
    ///
    /// The whole cycle runs under one lock so the plan is computed against
    /// a consistent snapshot. The returned batch is the hand-off to the
    /// execution context; this method performs no script side effects
    /// itself.
    pub fn cycle(&self) -> CommitBatch {
        let mut guard = self.inner.state.lock().unwrap();
        let state = &mut *guard;

        let raw = state.watch.poll();
        // A broken watch never halts the loop, only degrades it to
        // next-poll detection.
        if let Err(err) = state.watch.rearm() {
            error!(error = %err, "failed to re-arm watch; continuing with polled events");
        }

        let events = debounce_events(
            raw,
            &mut state.debounce,
            self.inner.fs.as_ref(),
            &self.inner.root,
        );

        let plan = compute_plan(
            &state.watched,
            &state.registry,
            &events,
            self.inner.fs.as_ref(),
            &self.inner.root,
        );

        if !plan.is_empty() {
            debug!(?plan, "computed reconciliation plan");
        }

        self.apply(state, &plan)
    }

    /// Run cycles (committing inline) until a cycle produces no work.
    ///
    /// Used at startup so load-order chains resolve before the poll loop
    /// starts: a script loaded in one cycle can watch further paths, which
    /// load in the next.
    pub fn preload(&self) {
        info!("preloading scripts until fixpoint");
        loop {
            let batch = self.cycle();
            if batch.is_empty() {
                break;
            }
            apply_batch(self.inner.engine.as_ref(), batch);
        }
    }

    /// Terminate every registered instance and clear the watched set.
    pub fn shutdown(&self) {
        let drained = {
            let mut state = self.inner.state.lock().unwrap();
            state.watched.clear();
            state.registry.drain()
        };

        info!(scripts = drained.len(), "shutting down script loader");
        for instance in drained {
            self.inner.engine.release_context(instance.path());
            instance.terminate();
        }
    }

    fn context_for(&self, instance: Arc<ScriptInstance>) -> ScriptContext {
        ScriptContext::new(
            instance,
            self.inner.root.clone(),
            Arc::clone(&self.inner.fs),
            self.loader_handle(),
        )
    }

    /// Apply a plan to the registry, producing the commit batch.
    ///
    /// Order matters: reloads first (so the load pass can double-check the
    /// registry), then loads, then unloads.
    fn apply(&self, state: &mut ReconcilerState, plan: &ReconcilePlan) -> CommitBatch {
        let mut batch = CommitBatch::default();

        let reload_queue = expand_reloads(&state.registry, &plan.to_reload);
        for path in reload_queue {
            // A script slated for unload is not worth replacing first.
            if plan.to_unload.contains(&path) {
                continue;
            }
            // No instance yet: the load pass picks it up if it is watched.
            let Some(old) = state.registry.get(&path) else {
                continue;
            };

            let fresh = Arc::new(ScriptInstance::new(&path));
            state.registry.insert(Arc::clone(&fresh));
            state
                .debounce
                .record(&path, &self.inner.root.join(&path), self.inner.fs.as_ref());
            batch.run.push(self.context_for(fresh));
            batch.terminate.push(old);
            info!(path = %path.display(), "reloaded script");
        }

        for path in &plan.to_load {
            // Double check: the reload pass above may have registered it.
            if state.registry.contains(path) {
                continue;
            }

            let fresh = Arc::new(ScriptInstance::new(path));
            state.registry.insert(Arc::clone(&fresh));
            state
                .debounce
                .record(path, &self.inner.root.join(path), self.inner.fs.as_ref());
            batch.run.push(self.context_for(fresh));
            info!(path = %path.display(), "loaded script");
        }

        for path in &plan.to_unload {
            if let Some(old) = state.registry.remove(path) {
                batch.terminate.push(old);
                info!(path = %path.display(), "unloaded script");
            }
        }

        batch
    }
}

/// Drop modify events whose content is unchanged, and keep the hash cache
/// in step with creates and deletes.
fn debounce_events(
    raw: Vec<FileEvent>,
    debounce: &mut DebounceCache,
    fs: &dyn ScriptFs,
    root: &Path,
) -> Vec<FileEvent> {
    let mut events = Vec::with_capacity(raw.len());

    for event in raw {
        let abs = root.join(&event.path);
        match event.kind {
            FileEventKind::Deleted => {
                debounce.forget(&event.path);
                events.push(event);
            }
            FileEventKind::Created => {
                debounce.record(&event.path, &abs, fs);
                events.push(event);
            }
            FileEventKind::Modified => {
                if !debounce.is_unchanged(&event.path, &abs, fs) {
                    events.push(event);
                }
            }
        }
    }

    events
}
