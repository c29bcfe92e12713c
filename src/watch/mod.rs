// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - The [`WatchBackend`] contract the reconciler polls each cycle.
//! - Wiring up a cross-platform filesystem watcher (`notify`) behind it.
//! - Content hashing so no-op `Modified` events (editor save with identical
//!   content, duplicate events from some backends) are dropped before
//!   planning.
//!
//! It does **not** know about scripts or dependencies; it only turns raw
//! filesystem changes into `(path, kind)` batches relative to the script
//! root.

pub mod debounce;
pub mod mock;
pub mod watcher;

pub use debounce::DebounceCache;
pub use mock::ScriptedWatch;
pub use watcher::{FileEvent, FileEventKind, NotifyWatch, WatchBackend};
