// tests/preload_fixpoint.rs

mod common;

use std::path::PathBuf;

use common::harness;

#[test]
fn preload_resolves_chained_loads_to_fixpoint() {
    let h = harness();
    h.add_script("a.sh", "a");
    h.add_script("b.sh", "b");
    h.add_script("c.sh", "c");
    h.watch_path("a.sh");

    // a pulls in b, b pulls in c: a three-deep load-order chain.
    h.engine.on_execute("a.sh", |ctx| {
        ctx.watch(&[PathBuf::from("b.sh")]);
        Ok(())
    });
    h.engine.on_execute("b.sh", |ctx| {
        ctx.watch(&[PathBuf::from("c.sh")]);
        Ok(())
    });

    h.reconciler.preload();

    assert_eq!(
        h.reconciler.loaded_paths(),
        vec![
            PathBuf::from("a.sh"),
            PathBuf::from("b.sh"),
            PathBuf::from("c.sh")
        ]
    );

    // One cycle per chain link, plus the empty cycle that detects the
    // fixpoint.
    assert!(h.watch.polls() <= 4, "took {} cycles", h.watch.polls());

    let runs = h
        .engine
        .events()
        .iter()
        .filter(|e| e.starts_with("run:"))
        .count();
    assert_eq!(runs, 3);
}

#[test]
fn preload_with_nothing_to_do_is_a_single_cycle() {
    let h = harness();
    h.reconciler.preload();
    assert_eq!(h.watch.polls(), 1);
    assert!(h.engine.events().is_empty());
}

#[test]
fn shutdown_terminates_every_registered_instance() {
    let h = harness();
    h.add_script("a.sh", "a");
    h.add_script("b.sh", "b");
    h.watch_path("a.sh");
    h.watch_path("b.sh");
    h.cycle_and_commit();
    assert_eq!(h.reconciler.loaded_paths().len(), 2);

    h.reconciler.shutdown();

    assert!(h.reconciler.loaded_paths().is_empty());
    assert!(h.reconciler.watched_paths().is_empty());

    let releases = h
        .engine
        .events()
        .iter()
        .filter(|e| e.starts_with("release:"))
        .count();
    assert_eq!(releases, 2);
}

#[test]
fn independent_reconcilers_do_not_share_state() {
    let first = harness();
    let second = harness();

    first.add_script("a.sh", "a");
    first.watch_path("a.sh");
    first.cycle_and_commit();

    second.cycle_and_commit();

    assert_eq!(first.reconciler.loaded_paths().len(), 1);
    assert!(second.reconciler.loaded_paths().is_empty());
    assert!(second.engine.events().is_empty());
}
