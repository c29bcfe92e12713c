// src/script/instance.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use tracing::warn;

use crate::script::resources::ResourceScope;

/// One loaded script.
///
/// The path (relative to the script root) is the immutable identity key; a
/// reload never mutates an instance, it registers a brand-new one for the
/// same path and terminates the old one.
#[derive(Debug)]
pub struct ScriptInstance {
    /// Logical name, derived from the file's base name with the extension
    /// stripped.
    name: String,
    path: PathBuf,
    /// Paths this script has declared a runtime dependency on. Always
    /// contains the script's own path.
    depends: Mutex<HashSet<PathBuf>>,
    /// Watermark: the newest modification time observed among declared
    /// dependencies.
    last_dependency_change: Mutex<SystemTime>,
    /// Net set of paths this script watches through its context, in watch
    /// order. Watching a path already present is a no-op; unwatching
    /// removes it.
    scoped_watches: Mutex<Vec<PathBuf>>,
    scoped_unwatch_armed: AtomicBool,
    resources: ResourceScope,
}

impl ScriptInstance {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        let mut depends = HashSet::new();
        depends.insert(path.clone());

        Self {
            name,
            path,
            depends: Mutex::new(depends),
            last_dependency_change: Mutex::new(SystemTime::UNIX_EPOCH),
            scoped_watches: Mutex::new(Vec::new()),
            scoped_unwatch_armed: AtomicBool::new(false),
            resources: ResourceScope::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn resources(&self) -> &ResourceScope {
        &self.resources
    }

    /// Declare a runtime dependency on another path.
    ///
    /// Declaring a dependency on oneself is a no-op. If the dependency's
    /// modification time is newer than the current watermark, the watermark
    /// is raised.
    pub fn declare_dependency(&self, dep: &Path, modified: Option<SystemTime>) {
        if dep == self.path {
            return;
        }

        {
            let mut depends = self.depends.lock().unwrap();
            depends.insert(dep.to_path_buf());
        }

        if let Some(modified) = modified {
            let mut last = self.last_dependency_change.lock().unwrap();
            if modified > *last {
                *last = modified;
            }
        }
    }

    pub fn depends_on(&self, path: &Path) -> bool {
        let depends = self.depends.lock().unwrap();
        depends.contains(path)
    }

    /// Snapshot of the declared dependency set.
    pub fn dependencies(&self) -> HashSet<PathBuf> {
        self.depends.lock().unwrap().clone()
    }

    pub fn last_dependency_change(&self) -> SystemTime {
        *self.last_dependency_change.lock().unwrap()
    }

    /// Track paths this script watches through its context.
    ///
    /// Returns the paths that were not already tracked; only those count
    /// as new claims on the loader's watched set.
    pub fn track_watches(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut watched = self.scoped_watches.lock().unwrap();
        let mut fresh = Vec::new();
        for path in paths {
            if !watched.contains(path) {
                watched.push(path.clone());
                fresh.push(path.clone());
            }
        }
        fresh
    }

    /// Stop tracking paths.
    ///
    /// Returns the paths that were actually tracked; unwatching a path
    /// this script never watched releases nothing.
    pub fn untrack_watches(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut watched = self.scoped_watches.lock().unwrap();
        let mut removed = Vec::new();
        for path in paths {
            if let Some(pos) = watched.iter().position(|p| p == path) {
                watched.remove(pos);
                removed.push(path.clone());
            }
        }
        removed
    }

    /// Take whatever is still tracked; used when the instance terminates.
    pub fn drain_watches(&self) -> Vec<PathBuf> {
        std::mem::take(&mut *self.scoped_watches.lock().unwrap())
    }

    /// Snapshot of the currently tracked scoped watches.
    pub fn scoped_watches(&self) -> Vec<PathBuf> {
        self.scoped_watches.lock().unwrap().clone()
    }

    /// Returns true only on the first call, so the scoped-unwatch teardown
    /// resource is registered exactly once per instance.
    pub(crate) fn arm_scoped_unwatch(&self) -> bool {
        !self.scoped_unwatch_armed.swap(true, Ordering::SeqCst)
    }

    /// Release everything this script allocated.
    ///
    /// Safe to call even if the script never ran; individual release
    /// failures are logged inside the scope and never propagated.
    pub fn terminate(&self) {
        let failures = self.resources.close_all();
        if failures > 0 {
            warn!(
                script = %self.name,
                failures,
                "some resources failed to release during terminate"
            );
        }
    }
}
