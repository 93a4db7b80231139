/// In-memory FileSystem.
///
/// Every write or touch advances a private clock by one second, so each
/// change gets a strictly newer modification time without sleeping.
/// Clones share the same storage: a tool or test keeps one clone to edit
/// files while the resource manager reads through another.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use rustc_hash::FxHashMap;
use super::FileSystem;

#[derive(Debug, Default)]
struct MemoryFiles {
    files: FxHashMap<PathBuf, (Vec<u8>, SystemTime)>,
    clock: u64,
}

impl MemoryFiles {
    fn next_time(&mut self) -> SystemTime {
        self.clock += 1;
        UNIX_EPOCH + Duration::from_secs(self.clock)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    inner: Arc<Mutex<MemoryFiles>>,
}

impl MemoryFileSystem {
    /// Create an empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, MemoryFiles>> {
        self.inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory filesystem lock poisoned"))
    }

    /// Create or overwrite a file with a fresh modification time
    pub fn write(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        if let Ok(mut inner) = self.lock() {
            let time = inner.next_time();
            inner.files.insert(path.as_ref().to_path_buf(), (contents.into(), time));
        }
    }

    /// Advance the modification time of an existing file without changing it
    ///
    /// Returns false if the file does not exist.
    pub fn touch(&self, path: impl AsRef<Path>) -> bool {
        let Ok(mut inner) = self.lock() else {
            return false;
        };
        let time = inner.next_time();
        match inner.files.get_mut(path.as_ref()) {
            Some(entry) => {
                entry.1 = time;
                true
            }
            None => false,
        }
    }

    /// Delete a file; returns false if it did not exist
    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        self.lock()
            .map(|mut inner| inner.files.remove(path.as_ref()).is_some())
            .unwrap_or(false)
    }

    /// Whether the file exists
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.lock()
            .map(|inner| inner.files.contains_key(path.as_ref()))
            .unwrap_or(false)
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
}

impl FileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        let inner = self.lock()?;
        inner.files.get(path).map(|(bytes, _)| bytes.clone()).ok_or_else(|| not_found(path))
    }

    fn modification_time(&self, path: &Path) -> io::Result<SystemTime> {
        let inner = self.lock()?;
        inner.files.get(path).map(|(_, time)| *time).ok_or_else(|| not_found(path))
    }
}

#[cfg(test)]
#[path = "memory_file_system_tests.rs"]
mod tests;
