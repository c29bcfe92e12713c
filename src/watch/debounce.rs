// src/watch/debounce.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::fs::ScriptFs;

/// In-memory cache of file content hashes, keyed by root-relative path.
///
/// Some watch backends deliver several `Modified` events for a single save,
/// and editors frequently rewrite files without changing their content.
/// Dropping those events here keeps the reconciliation plan empty when
/// nothing actually changed.
#[derive(Debug, Default)]
pub struct DebounceCache {
    hashes: HashMap<PathBuf, String>,
}

impl DebounceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the file's content hash matches the cached one, i.e.
    /// a `Modified` event for it carries no new information.
    ///
    /// An unreadable or missing file is never treated as unchanged; its
    /// cache entry is dropped so the next observation re-hashes it.
    pub fn is_unchanged(&mut self, rel: &Path, abs: &Path, fs: &dyn ScriptFs) -> bool {
        let data = match fs.read(abs) {
            Ok(data) => data,
            Err(_) => {
                self.hashes.remove(rel);
                return false;
            }
        };

        let hash = blake3::hash(&data).to_hex().to_string();
        match self.hashes.get(rel) {
            Some(cached) if *cached == hash => {
                debug!(path = ?rel, "modify event debounced (content unchanged)");
                true
            }
            _ => {
                self.hashes.insert(rel.to_path_buf(), hash);
                false
            }
        }
    }

    /// Record the current content hash for a path without any comparison.
    /// Used for `Created` events so a later no-op modify can be dropped.
    pub fn record(&mut self, rel: &Path, abs: &Path, fs: &dyn ScriptFs) {
        if let Ok(data) = fs.read(abs) {
            let hash = blake3::hash(&data).to_hex().to_string();
            self.hashes.insert(rel.to_path_buf(), hash);
        }
    }

    /// Drop the cached hash for a path (on delete).
    pub fn forget(&mut self, rel: &Path) {
        self.hashes.remove(rel);
    }
}
