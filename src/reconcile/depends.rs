// src/reconcile/depends.rs

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use crate::script::ScriptRegistry;

/// Expand a set of changed paths into the full reload queue by following
/// reverse dependency edges until fixpoint.
///
/// Changing file A must reload not only A's own script but every registered
/// script that declared a dependency on A, and every script dependent on
/// those, transitively. The already-added guard makes this terminate even
/// when scripts declare dependencies on each other in a cycle.
///
/// The queue preserves discovery order and contains each path exactly once.
/// Seeds without a registered instance are kept; the apply pass decides
/// what to do with them.
pub fn expand_reloads(registry: &ScriptRegistry, seeds: &BTreeSet<PathBuf>) -> Vec<PathBuf> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut queue: Vec<PathBuf> = Vec::new();

    for seed in seeds {
        visit(registry, seed, &mut seen, &mut queue);
    }

    queue
}

fn visit(
    registry: &ScriptRegistry,
    path: &Path,
    seen: &mut HashSet<PathBuf>,
    queue: &mut Vec<PathBuf>,
) {
    if !seen.insert(path.to_path_buf()) {
        return;
    }
    queue.push(path.to_path_buf());

    for instance in registry.snapshot() {
        if instance.path() != path && instance.depends_on(path) {
            visit(registry, instance.path(), seen, queue);
        }
    }
}
