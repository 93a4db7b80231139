/// Binary buffer cache.
///
/// One loaded generation of a file per path: the first `load` reads the
/// whole file, later loads of the same path return the same `BufferId`
/// without touching the filesystem. Files are identified by path, never
/// by content, so two files with identical bytes are two buffers.
///
/// `release` drops the path entry and frees the bytes. The `BufferId` is
/// generational, so ids handed out before the release stop resolving
/// instead of pointing at a later load of the same path.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use slotmap::{new_key_type, SlotMap};
use crate::error::{Error, Result};
use crate::fs::FileSystem;
use crate::utils::VariantCache;

// ===== SLOT MAP KEY =====

new_key_type! {
    /// One loaded generation of a buffer file.
    pub struct BufferId;
}

// ===== BUFFER =====

/// Bytes of one buffer file
#[derive(Debug)]
pub struct Buffer {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl Buffer {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ===== BUFFER CACHE =====

pub struct BufferCache {
    file_system: Arc<dyn FileSystem>,
    buffers: SlotMap<BufferId, Buffer>,
    paths: VariantCache<PathBuf, BufferId>,
}

impl BufferCache {
    pub fn new(file_system: Arc<dyn FileSystem>) -> Self {
        Self {
            file_system,
            buffers: SlotMap::with_key(),
            paths: VariantCache::new(),
        }
    }

    /// Return the buffer for `path`, reading the file on first request
    ///
    /// # Errors
    ///
    /// `MissingFile` if the file cannot be read; nothing is cached and
    /// the next call retries.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<BufferId> {
        let path = path.as_ref();
        let file_system = &self.file_system;
        let buffers = &mut self.buffers;

        let id = *self.paths.try_get_or_create(path.to_path_buf(), |path| {
            let bytes = file_system.read_file(path).map_err(|e| {
                crate::engine_warn!("galaxy3d::BufferCache", "Cannot read '{}': {}", path.display(), e);
                Error::MissingFile(path.display().to_string())
            })?;
            crate::engine_debug!("galaxy3d::BufferCache", "Loaded '{}' ({} bytes)",
                path.display(), bytes.len());
            Ok(buffers.insert(Buffer { path: path.clone(), bytes }))
        })?;
        Ok(id)
    }

    /// Drop the buffer loaded from `path` and free its bytes.
    ///
    /// Returns false if nothing was loaded from that path.
    pub fn release(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match self.paths.remove(path) {
            Some(id) => {
                self.buffers.remove(id);
                crate::engine_debug!("galaxy3d::BufferCache", "Released '{}'", path.display());
                true
            }
            None => false,
        }
    }

    // ===== ACCESS =====

    pub fn buffer(&self, id: BufferId) -> Option<&Buffer> {
        self.buffers.get(id)
    }

    /// Bytes of a live buffer
    ///
    /// # Errors
    ///
    /// `InvalidResource` if the buffer was released
    pub fn bytes(&self, id: BufferId) -> Result<&[u8]> {
        match self.buffers.get(id) {
            Some(buffer) => Ok(&buffer.bytes),
            None => Err(Error::InvalidResource(format!("buffer {:?} was released", id))),
        }
    }

    pub fn buffer_id(&self, path: impl AsRef<Path>) -> Option<BufferId> {
        self.paths.get(path.as_ref()).copied()
    }

    pub fn contains(&self, id: BufferId) -> bool {
        self.buffers.contains_key(id)
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }
}

#[cfg(test)]
#[path = "buffer_cache_tests.rs"]
mod tests;
