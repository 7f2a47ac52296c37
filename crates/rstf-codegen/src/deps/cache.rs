//! Warm filesystem cache shared by concurrent import walks.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::frontend::go::is_source_file;

/// Memoizes file contents and directory probes, keyed by absolute path.
///
/// All maps sit behind one lock. Lookups follow read-check, unlocked I/O,
/// write-back: two tasks racing on the same path may both hit the disk, but
/// every result is stored.
#[derive(Debug, Default)]
pub struct FsCache {
    inner: Mutex<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    files: HashMap<PathBuf, Arc<str>>,
    has_source: HashMap<PathBuf, bool>,
    is_file: HashMap<PathBuf, bool>,
}

impl FsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the file's text, reading it from disk on first access.
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn read_file(&self, path: &Path) -> std::io::Result<Arc<str>> {
        if let Some(content) = self.inner.lock().files.get(path) {
            return Ok(Arc::clone(content));
        }

        let bytes = std::fs::read(path)?;
        let content: Arc<str> = Arc::from(String::from_utf8_lossy(&bytes).as_ref());

        self.inner
            .lock()
            .files
            .insert(path.to_path_buf(), Arc::clone(&content));
        Ok(content)
    }

    /// Whether `dir` directly contains at least one handler source file.
    /// Unreadable directories count as having none.
    pub fn dir_has_source(&self, dir: &Path) -> bool {
        if let Some(result) = self.inner.lock().has_source.get(dir) {
            return *result;
        }

        let result = std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .any(|e| e.file_type().is_ok_and(|t| t.is_file()) && is_source_file(&e.path()))
            })
            .unwrap_or(false);

        self.inner.lock().has_source.insert(dir.to_path_buf(), result);
        result
    }

    /// Whether `path` exists and is a regular file.
    pub fn is_file(&self, path: &Path) -> bool {
        if let Some(result) = self.inner.lock().is_file.get(path) {
            return *result;
        }

        let result = path.is_file();

        self.inner.lock().is_file.insert(path.to_path_buf(), result);
        result
    }

    /// Evicts everything cached about the given paths, anything beneath them,
    /// and the source probe of their parent directories.
    pub fn invalidate(&self, paths: &[PathBuf]) {
        let mut state = self.inner.lock();
        for path in paths {
            state.files.retain(|k, _| !k.starts_with(path));
            state.is_file.retain(|k, _| !k.starts_with(path));
            state.has_source.retain(|k, _| !k.starts_with(path));
            if let Some(parent) = path.parent() {
                state.has_source.remove(parent);
            }
        }
    }

    /// Number of cached file contents.
    pub fn cached_files(&self) -> usize {
        self.inner.lock().files.len()
    }
}
