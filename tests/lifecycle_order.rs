// tests/lifecycle_order.rs

mod common;

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;

use scriptwatch::script::ResourceScope;
use scriptwatch::watch::{FileEvent, FileEventKind};

use common::harness;

#[test]
fn replacement_runs_before_predecessor_terminates() {
    let h = harness();
    h.add_script("p.sh", "v1");
    h.watch_path("p.sh");

    // Every instance of p marks its own teardown in the event log.
    let engine = h.engine.clone();
    h.engine.on_execute("p.sh", move |ctx| {
        let engine = engine.clone();
        ctx.resources().register("marker", move || {
            engine.push_event("closed:p.sh");
            Ok(())
        });
        Ok(())
    });

    h.cycle_and_commit();

    h.add_script("p.sh", "v2");
    h.watch
        .push_batch(vec![FileEvent::new("p.sh", FileEventKind::Modified)]);
    h.cycle_and_commit();

    let events = h.engine.events();
    let second_run = events
        .iter()
        .enumerate()
        .filter(|(_, e)| *e == "run:p.sh")
        .map(|(i, _)| i)
        .nth(1)
        .expect("replacement instance ran");
    let closed = events
        .iter()
        .position(|e| e == "closed:p.sh")
        .expect("old instance terminated");

    // The new instance started before the old one's resources were released.
    assert!(second_run < closed, "events: {events:?}");
}

#[test]
fn run_failure_keeps_instance_registered_and_retryable() {
    let h = harness();
    h.add_script("bad.sh", "v1");
    h.add_script("ok.sh", "fine");
    h.watch_path("bad.sh");
    h.watch_path("ok.sh");

    let attempts = Arc::new(AtomicUsize::new(0));
    let seen = attempts.clone();
    h.engine.on_execute("bad.sh", move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("script blew up"))
    });

    h.cycle_and_commit();

    // The failing script stays registered; its neighbour is unaffected.
    assert_eq!(
        h.reconciler.loaded_paths(),
        vec![PathBuf::from("bad.sh"), PathBuf::from("ok.sh")]
    );
    assert_eq!(attempts.load(Ordering::SeqCst), 1);

    // A subsequent file change retries it.
    h.add_script("bad.sh", "v2");
    h.watch
        .push_batch(vec![FileEvent::new("bad.sh", FileEventKind::Modified)]);
    h.cycle_and_commit();

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn one_failing_resource_does_not_block_the_rest() {
    let scope = ResourceScope::new();
    let released = Arc::new(AtomicUsize::new(0));

    let r1 = released.clone();
    scope.register("first", move || {
        r1.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    scope.register("broken", || Err(anyhow!("cannot close")));
    let r2 = released.clone();
    scope.register("last", move || {
        r2.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let failures = scope.close_all();

    assert_eq!(failures, 1);
    assert_eq!(released.load(Ordering::SeqCst), 2);

    // Closing again is a no-op, not a double release.
    assert_eq!(scope.close_all(), 0);
    assert_eq!(released.load(Ordering::SeqCst), 2);
}

#[test]
fn terminate_is_safe_when_run_never_happened() {
    use scriptwatch::script::ScriptInstance;

    let instance = ScriptInstance::new("never_ran.sh");
    instance.terminate();
    instance.terminate();
}

#[test]
fn failing_termination_does_not_block_other_unloads() {
    let h = harness();
    h.add_script("bad.sh", "v1");
    h.add_script("ok.sh", "v1");
    h.watch_path("bad.sh");
    h.watch_path("ok.sh");

    h.engine.on_execute("bad.sh", |ctx| {
        ctx.resources()
            .register("stuck", || Err(anyhow!("release failed")));
        Ok(())
    });

    h.cycle_and_commit();

    h.unwatch_path("bad.sh");
    h.unwatch_path("ok.sh");
    h.cycle_and_commit();

    // Both scripts are gone even though bad.sh's resource failed to close.
    assert!(h.reconciler.loaded_paths().is_empty());
    let releases = h
        .engine
        .events()
        .iter()
        .filter(|e| e.starts_with("release:"))
        .count();
    assert_eq!(releases, 2);
}

#[test]
fn unwatching_a_scoped_path_leaves_other_claims_alone() {
    let h = harness();
    h.add_script("a.sh", "v1");
    h.add_script("shared.sh", "v1");
    h.watch_path("a.sh");
    h.watch_path("shared.sh"); // the host's own claim

    // a watches and then unwatches shared; its scoped teardown must end
    // up with nothing left to release.
    h.engine.on_execute("a.sh", |ctx| {
        ctx.watch(&[PathBuf::from("shared.sh")]);
        ctx.unwatch(&[PathBuf::from("shared.sh")]);
        Ok(())
    });

    h.cycle_and_commit();
    assert_eq!(
        h.reconciler.loaded_paths(),
        vec![PathBuf::from("a.sh"), PathBuf::from("shared.sh")]
    );

    // Unloading a must not release the host's claim on shared.
    h.unwatch_path("a.sh");
    h.cycle_and_commit();
    h.cycle_and_commit();

    assert_eq!(
        h.reconciler.loaded_paths(),
        vec![PathBuf::from("shared.sh")]
    );
}

#[test]
fn rewatched_scoped_paths_still_release_on_terminate() {
    let h = harness();
    h.add_script("loader.sh", "v1");
    h.add_script("worker.sh", "v1");
    h.watch_path("loader.sh");

    h.engine.on_execute("loader.sh", |ctx| {
        let worker = vec![PathBuf::from("worker.sh")];
        ctx.watch(&worker);
        ctx.unwatch(&worker);
        ctx.watch(&worker);
        Ok(())
    });

    h.reconciler.preload();
    assert_eq!(
        h.reconciler.loaded_paths(),
        vec![PathBuf::from("loader.sh"), PathBuf::from("worker.sh")]
    );

    h.unwatch_path("loader.sh");
    h.cycle_and_commit();
    h.cycle_and_commit();

    assert!(h.reconciler.loaded_paths().is_empty());
}

#[test]
fn scripts_watched_by_a_script_unload_with_it() {
    let h = harness();
    h.add_script("loader.sh", "v1");
    h.add_script("worker.sh", "v1");
    h.watch_path("loader.sh");

    h.engine.on_execute("loader.sh", |ctx| {
        ctx.watch(&[PathBuf::from("worker.sh")]);
        Ok(())
    });

    h.reconciler.preload();
    assert_eq!(
        h.reconciler.loaded_paths(),
        vec![PathBuf::from("loader.sh"), PathBuf::from("worker.sh")]
    );

    // Unloading the loader releases its scoped watch on the worker, which
    // then unloads as an orphan on the following cycle.
    h.unwatch_path("loader.sh");
    h.cycle_and_commit();
    h.cycle_and_commit();

    assert!(h.reconciler.loaded_paths().is_empty());
}
