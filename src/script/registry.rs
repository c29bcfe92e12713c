// src/script/registry.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::script::instance::ScriptInstance;

/// Authoritative map from path to live [`ScriptInstance`].
///
/// Holds at most one instance per path. The registry itself is not
/// synchronized; the reconciler owns it behind its cycle lock.
#[derive(Debug, Default)]
pub struct ScriptRegistry {
    scripts: HashMap<PathBuf, Arc<ScriptInstance>>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instance under its path, returning the instance it
    /// replaced (if any).
    pub fn insert(&mut self, instance: Arc<ScriptInstance>) -> Option<Arc<ScriptInstance>> {
        self.scripts.insert(instance.path().to_path_buf(), instance)
    }

    pub fn remove(&mut self, path: &Path) -> Option<Arc<ScriptInstance>> {
        self.scripts.remove(path)
    }

    pub fn get(&self, path: &Path) -> Option<Arc<ScriptInstance>> {
        self.scripts.get(path).cloned()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.scripts.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Snapshot of all registered instances, used during planning.
    pub fn snapshot(&self) -> Vec<Arc<ScriptInstance>> {
        self.scripts.values().cloned().collect()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.scripts.keys().cloned().collect()
    }

    /// Remove and return every registered instance (shutdown).
    pub fn drain(&mut self) -> Vec<Arc<ScriptInstance>> {
        self.scripts.drain().map(|(_, v)| v).collect()
    }
}
