// src/fs.rs

//! Filesystem access used during plan computation.
//!
//! The reconciler never touches `std::fs` directly; it goes through
//! [`ScriptFs`] so that plan computation can be tested against an in-memory
//! filesystem without tempdirs or sleeps.

use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use anyhow::{Context, Result, anyhow};

/// Abstract filesystem interface for existence checks, modification times
/// and content reads.
pub trait ScriptFs: Send + Sync + Debug {
    fn exists(&self, path: &Path) -> bool;

    /// Modification time of a file, or `None` if it does not exist or the
    /// metadata call fails.
    fn modified(&self, path: &Path) -> Option<SystemTime>;

    fn read(&self, path: &Path) -> Result<Vec<u8>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFs;

impl ScriptFs for RealFs {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        fs::metadata(path).ok().and_then(|m| m.modified().ok())
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("reading file {:?}", path))
    }
}

#[derive(Debug, Clone)]
struct MemFile {
    data: Vec<u8>,
    modified: SystemTime,
}

/// In-memory filesystem for tests.
///
/// Clones share the same underlying map, so a test can hand a clone to the
/// reconciler and keep mutating files through its own handle.
#[derive(Debug, Clone, Default)]
pub struct MemFs {
    files: Arc<Mutex<HashMap<PathBuf, MemFile>>>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.add_file_at(path, content, SystemTime::now());
    }

    pub fn add_file_at(
        &self,
        path: impl AsRef<Path>,
        content: impl Into<Vec<u8>>,
        modified: SystemTime,
    ) {
        let mut files = self.files.lock().unwrap();
        files.insert(
            path.as_ref().to_path_buf(),
            MemFile {
                data: content.into(),
                modified,
            },
        );
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) {
        let mut files = self.files.lock().unwrap();
        files.remove(path.as_ref());
    }

    /// Bump a file's modification time without changing its content.
    pub fn touch(&self, path: impl AsRef<Path>, modified: SystemTime) {
        let mut files = self.files.lock().unwrap();
        if let Some(file) = files.get_mut(path.as_ref()) {
            file.modified = modified;
        }
    }
}

impl ScriptFs for MemFs {
    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        files.contains_key(path)
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        let files = self.files.lock().unwrap();
        files.get(path).map(|f| f.modified)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let files = self.files.lock().unwrap();
        files
            .get(path)
            .map(|f| f.data.clone())
            .ok_or_else(|| anyhow!("file not found: {:?}", path))
    }
}
