// src/reconcile/plan.rs

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use crate::fs::ScriptFs;
use crate::script::ScriptRegistry;
use crate::watch::{FileEvent, FileEventKind};

/// What one reconciliation cycle intends to do.
///
/// The three sets are disjoint by construction:
/// - `to_load`: paths with no instance that should have one;
/// - `to_unload`: registered paths that should not stay loaded;
/// - `to_reload`: paths whose existing instance must be replaced (before
///   dependency expansion).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub to_load: BTreeSet<PathBuf>,
    pub to_unload: BTreeSet<PathBuf>,
    pub to_reload: BTreeSet<PathBuf>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.to_load.is_empty() && self.to_unload.is_empty() && self.to_reload.is_empty()
    }
}

/// Compute the plan for one cycle.
///
/// Two independent sources of truth feed in: the watched paths (declared
/// intent) and the raw filesystem events since the last poll. Running this
/// twice against an unchanged filesystem with no new events yields an empty
/// plan the second time.
///
/// `watched` is a multiset: the same path watched by two different scripts
/// appears twice, and unwatching removes one occurrence. Duplicates are
/// harmless here because the plan sets deduplicate.
pub fn compute_plan(
    watched: &[PathBuf],
    registry: &ScriptRegistry,
    events: &[FileEvent],
    fs: &dyn ScriptFs,
    root: &Path,
) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();

    // Watched paths: if the file exists, make sure something is loaded for
    // it; if it doesn't, make sure nothing is.
    for path in watched {
        if fs.exists(&root.join(path)) {
            if !registry.contains(path) {
                plan.to_load.insert(path.clone());
            }
        } else if registry.contains(path) {
            plan.to_unload.insert(path.clone());
        }
    }

    // Registered scripts which are no longer being watched.
    for instance in registry.snapshot() {
        if !watched.iter().any(|p| p == instance.path()) {
            plan.to_unload.insert(instance.path().to_path_buf());
        }
    }

    // Raw filesystem events. Deletes only produce unload *candidates*: a
    // delete racing with a create in the same batch must not destroy a
    // script that is simultaneously being (re)loaded.
    let mut try_unload: HashSet<PathBuf> = HashSet::new();

    for event in events {
        // Already being loaded / unloaded elsewhere in this plan.
        if plan.to_load.contains(&event.path) || plan.to_unload.contains(&event.path) {
            continue;
        }

        match event.kind {
            FileEventKind::Deleted => {
                try_unload.insert(event.path.clone());
            }
            FileEventKind::Created | FileEventKind::Modified => {
                if registry.contains(&event.path) {
                    plan.to_reload.insert(event.path.clone());
                } else if watched.contains(&event.path) {
                    // Load wins over reload for a path with no instance.
                    plan.to_load.insert(event.path.clone());
                } else {
                    // Not a top-level script, but it may be a dependency;
                    // queueing it makes its dependents reload.
                    plan.to_reload.insert(event.path.clone());
                }
            }
        }
    }

    // Promote delete candidates only when nothing else in this cycle is
    // loading or reloading the same path.
    for path in try_unload {
        if !registry.contains(&path) {
            continue;
        }
        if plan.to_load.contains(&path) || plan.to_reload.contains(&path) {
            continue;
        }
        plan.to_unload.insert(path);
    }

    plan
}
