// src/script/context.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::fs::ScriptFs;
use crate::reconcile::LoaderHandle;
use crate::script::instance::ScriptInstance;
use crate::script::resources::ResourceScope;

/// Capability surface handed to the execution engine for one script run.
///
/// Everything a script may do to the reconciler goes through here: declare
/// a dependency, watch or unwatch further paths, register resources. The
/// engine decides how these capabilities are surfaced to the script body.
#[derive(Clone)]
pub struct ScriptContext {
    instance: Arc<ScriptInstance>,
    root: PathBuf,
    fs: Arc<dyn ScriptFs>,
    loader: LoaderHandle,
}

impl fmt::Debug for ScriptContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptContext")
            .field("name", &self.instance.name())
            .field("path", &self.instance.path())
            .finish_non_exhaustive()
    }
}

impl ScriptContext {
    pub(crate) fn new(
        instance: Arc<ScriptInstance>,
        root: PathBuf,
        fs: Arc<dyn ScriptFs>,
        loader: LoaderHandle,
    ) -> Self {
        Self {
            instance,
            root,
            fs,
            loader,
        }
    }

    pub fn name(&self) -> &str {
        self.instance.name()
    }

    /// Path of the script, relative to the script root.
    pub fn path(&self) -> &Path {
        self.instance.path()
    }

    pub fn absolute_path(&self) -> PathBuf {
        self.root.join(self.instance.path())
    }

    pub fn instance(&self) -> &Arc<ScriptInstance> {
        &self.instance
    }

    pub fn resources(&self) -> &ResourceScope {
        self.instance.resources()
    }

    /// Read the script's own source.
    pub fn read_source(&self) -> Result<Vec<u8>> {
        self.fs.read(&self.absolute_path())
    }

    /// Declare a runtime dependency on another path (relative to the script
    /// root). Changes to that path will invalidate this script.
    pub fn depend(&self, path: impl AsRef<Path>) {
        let rel = path.as_ref();
        let modified = self.fs.modified(&self.root.join(rel));
        self.instance.declare_dependency(rel, modified);
    }

    /// Add paths to the watched set.
    ///
    /// The watches are scoped to this script: it holds one claim per path
    /// (watching the same path twice is a no-op), [`Self::unwatch`]
    /// releases a claim early, and terminating the script releases
    /// whatever claims remain. Another owner's claim on the same path is
    /// never touched.
    pub fn watch(&self, paths: &[PathBuf]) {
        let fresh = self.instance.track_watches(paths);
        if fresh.is_empty() {
            return;
        }
        self.loader.watch_all(&fresh);

        if self.instance.arm_scoped_unwatch() {
            let loader = self.loader.clone();
            let instance = Arc::downgrade(&self.instance);
            self.instance
                .resources()
                .register("watched-paths", move || -> Result<()> {
                    if let Some(instance) = instance.upgrade() {
                        loader.unwatch_all(&instance.drain_watches());
                    }
                    Ok(())
                });
        }
    }

    /// Remove paths from the watched set, releasing this script's claim on
    /// them. Paths the script never watched are left alone.
    pub fn unwatch(&self, paths: &[PathBuf]) {
        let removed = self.instance.untrack_watches(paths);
        if !removed.is_empty() {
            self.loader.unwatch_all(&removed);
        }
    }
}
