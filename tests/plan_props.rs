// tests/plan_props.rs

//! Property tests over the pure plan computation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use proptest::prelude::*;

use scriptwatch::fs::MemFs;
use scriptwatch::reconcile::compute_plan;
use scriptwatch::script::{ScriptInstance, ScriptRegistry};
use scriptwatch::watch::{FileEvent, FileEventKind};

const ROOT: &str = "scripts";
const POOL: [&str; 4] = ["a.sh", "b.sh", "c.sh", "d.sh"];

fn subset() -> impl Strategy<Value = Vec<&'static str>> {
    proptest::sample::subsequence(POOL.to_vec(), 0..=POOL.len())
}

fn event_kind() -> impl Strategy<Value = FileEventKind> {
    prop_oneof![
        Just(FileEventKind::Created),
        Just(FileEventKind::Deleted),
        Just(FileEventKind::Modified),
    ]
}

fn events() -> impl Strategy<Value = Vec<FileEvent>> {
    proptest::collection::vec(
        (proptest::sample::select(POOL.to_vec()), event_kind())
            .prop_map(|(name, kind)| FileEvent::new(name, kind)),
        0..8,
    )
}

proptest! {
    #[test]
    fn plan_sets_are_pairwise_disjoint(
        watched in subset(),
        on_disk in subset(),
        registered in subset(),
        events in events(),
    ) {
        let fs = MemFs::new();
        for name in &on_disk {
            fs.add_file(Path::new(ROOT).join(name), *name);
        }

        let mut registry = ScriptRegistry::new();
        for name in &registered {
            registry.insert(Arc::new(ScriptInstance::new(*name)));
        }

        let watched: Vec<PathBuf> = watched.iter().map(PathBuf::from).collect();
        let plan = compute_plan(&watched, &registry, &events, &fs, Path::new(ROOT));

        for path in &plan.to_load {
            prop_assert!(!plan.to_unload.contains(path));
            prop_assert!(!plan.to_reload.contains(path));
        }
        for path in &plan.to_unload {
            prop_assert!(!plan.to_reload.contains(path));
        }

        // Loads only target paths without an instance; unloads only target
        // paths with one.
        for path in &plan.to_load {
            prop_assert!(!registry.contains(path));
        }
        for path in &plan.to_unload {
            prop_assert!(registry.contains(path));
        }
    }

    #[test]
    fn plan_is_empty_when_watched_matches_registry_and_disk(
        names in subset(),
    ) {
        let fs = MemFs::new();
        let mut registry = ScriptRegistry::new();
        for name in &names {
            fs.add_file(Path::new(ROOT).join(name), *name);
            registry.insert(Arc::new(ScriptInstance::new(*name)));
        }

        let watched: Vec<PathBuf> = names.iter().map(PathBuf::from).collect();
        let plan = compute_plan(&watched, &registry, &[], &fs, Path::new(ROOT));

        prop_assert!(plan.is_empty());
    }
}
