// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::errors::{Result, ScriptwatchError};

/// What happened to a watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Created,
    Deleted,
    Modified,
}

/// One filesystem change, with `path` relative to the script root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub path: PathBuf,
    pub kind: FileEventKind,
}

impl FileEvent {
    pub fn new(path: impl Into<PathBuf>, kind: FileEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Contract the reconciler polls once per cycle.
///
/// `rearm` must be called after every `poll`. A failing rearm degrades the
/// loop to next-poll detection; it never halts it.
pub trait WatchBackend: Send {
    /// Drain all changes observed since the previous poll.
    fn poll(&mut self) -> Vec<FileEvent>;

    /// Re-arm the underlying watch. Implementations that lost their watch
    /// token (or whose backend reported an error) recreate the watch here;
    /// an `Err` means even the recreation failed.
    fn rearm(&mut self) -> Result<()>;
}

/// `notify`-backed watch over the script root directory.
///
/// Events are received on a channel fed by the notify callback thread and
/// drained synchronously by `poll`. Backend errors poison a health flag;
/// the next `rearm` rebuilds the watcher from scratch.
pub struct NotifyWatch {
    root: PathBuf,
    exclude: Option<GlobSet>,
    watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    healthy: Arc<AtomicBool>,
}

impl std::fmt::Debug for NotifyWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyWatch")
            .field("root", &self.root)
            .field("healthy", &self.healthy.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl NotifyWatch {
    /// Start watching `root` recursively. `exclude` patterns are matched
    /// against root-relative paths with forward slashes.
    pub fn new(root: impl Into<PathBuf>, exclude: &[String]) -> Result<Self> {
        let root = root.into();
        let root = root.canonicalize().unwrap_or(root); // best-effort

        let exclude = build_exclude_set(exclude)?;
        let healthy = Arc::new(AtomicBool::new(true));
        let (watcher, rx) = create_watcher(&root)?;

        Ok(Self {
            root,
            exclude,
            watcher,
            rx,
            healthy,
        })
    }

    fn excluded(&self, rel: &str) -> bool {
        self.exclude.as_ref().is_some_and(|set| set.is_match(rel))
    }
}

impl WatchBackend for NotifyWatch {
    fn poll(&mut self) -> Vec<FileEvent> {
        let mut out = Vec::new();

        loop {
            match self.rx.try_recv() {
                Ok(Ok(event)) => {
                    let Some(kind) = map_event_kind(&event.kind) else {
                        continue;
                    };

                    for path in &event.paths {
                        let Some(rel) = relative_str(&self.root, path) else {
                            warn!(
                                "could not relativize path {:?} against root {:?}",
                                path, self.root
                            );
                            continue;
                        };

                        if self.excluded(&rel) {
                            debug!(path = %rel, "event excluded by pattern");
                            continue;
                        }

                        out.push(FileEvent::new(PathBuf::from(rel), kind));
                    }
                }
                Ok(Err(err)) => {
                    warn!(error = %err, "watch backend reported an error");
                    self.healthy.store(false, Ordering::Relaxed);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("watch event channel disconnected");
                    self.healthy.store(false, Ordering::Relaxed);
                    break;
                }
            }
        }

        out
    }

    fn rearm(&mut self) -> Result<()> {
        if self.healthy.load(Ordering::Relaxed) {
            return Ok(());
        }

        warn!(root = ?self.root, "watch no longer valid, recreating");
        let (watcher, rx) = create_watcher(&self.root)?;
        self.watcher = watcher;
        self.rx = rx;
        self.healthy.store(true, Ordering::Relaxed);
        Ok(())
    }
}

fn create_watcher(
    root: &Path,
) -> Result<(RecommendedWatcher, Receiver<notify::Result<Event>>)> {
    let (tx, rx) = std::sync::mpsc::channel::<notify::Result<Event>>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            // Receiver gone means the watch is being torn down; nothing to do.
            let _ = tx.send(res);
        },
        Config::default(),
    )
    .map_err(|e| ScriptwatchError::Watch(format!("creating watcher: {e}")))?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|e| ScriptwatchError::Watch(format!("watching {root:?}: {e}")))?;

    Ok((watcher, rx))
}

fn build_exclude_set(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat)
            .map_err(|e| ScriptwatchError::Config(format!("invalid glob pattern '{pat}': {e}")))?;
        builder.add(glob);
    }

    let set = builder
        .build()
        .map_err(|e| ScriptwatchError::Config(format!("building exclude globset: {e}")))?;
    Ok(Some(set))
}

fn map_event_kind(kind: &EventKind) -> Option<FileEventKind> {
    match kind {
        EventKind::Create(_) => Some(FileEventKind::Created),
        EventKind::Remove(_) => Some(FileEventKind::Deleted),
        EventKind::Modify(_) | EventKind::Any | EventKind::Other => Some(FileEventKind::Modified),
        EventKind::Access(_) => None,
    }
}

/// Convert a path into a string relative to `root`, with forward slashes.
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let s = rel.to_string_lossy().replace('\\', "/");
    Some(s)
}
