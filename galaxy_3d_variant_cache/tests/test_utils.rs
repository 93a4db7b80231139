#![allow(dead_code)]
//! Test utilities - temporary asset directories and a recording backend
//!
//! Integration tests run against the real `StdFileSystem`. Modification
//! times are set explicitly on every write so hot reload never depends on
//! the filesystem's timestamp granularity.

use galaxy_3d_variant_cache::galaxy3d::backend::{
    BackendError, BackendResult, GraphicsBackend, ProgramHandle, StageHandle, StageKind, StageSource,
};
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

// ============================================================================
// TEMPORARY DIRECTORY
// ============================================================================

/// Per-test temporary directory (removed when the `TempDir` drops)
pub struct TestDir {
    root: TempDir,
    /// Next explicit modification time (strictly increasing)
    clock: SystemTime,
}

impl TestDir {
    pub fn new(name: &str) -> Self {
        let root = tempfile::Builder::new()
            .prefix(&format!("galaxy3d_{}_", name))
            .tempdir()
            .unwrap();
        Self {
            root,
            clock: SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    /// Write a file and give it a new, later modification time
    pub fn write(&mut self, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).unwrap();
        self.bump(&path);
        path
    }

    /// Change only the modification time
    pub fn touch(&mut self, name: &str) {
        let path = self.path(name);
        self.bump(&path);
    }

    pub fn remove(&self, name: &str) {
        std::fs::remove_file(self.path(name)).unwrap();
    }

    fn bump(&mut self, path: &Path) {
        self.clock += Duration::from_secs(10);
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(self.clock)
            .unwrap();
    }
}

// ============================================================================
// RECORDING BACKEND
// ============================================================================

/// GraphicsBackend handing out sequential handles
///
/// A stage whose body contains `#error` fails to compile.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_handle: u64,
    pub compiled: Vec<String>,
    pub links: usize,
    pub live_stages: HashSet<StageHandle>,
    pub live_programs: HashSet<ProgramHandle>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl GraphicsBackend for RecordingBackend {
    fn compile_stage(&mut self, kind: StageKind, source: &StageSource) -> BackendResult<StageHandle> {
        self.compiled.push(source.assemble());
        if source.body.contains("#error") {
            return Err(BackendError::new(format!("{:?}: #error directive", kind)));
        }
        let handle = StageHandle(self.allocate());
        self.live_stages.insert(handle);
        Ok(handle)
    }

    fn link_program(&mut self, vertex: StageHandle, fragment: StageHandle) -> BackendResult<ProgramHandle> {
        if !self.live_stages.contains(&vertex) || !self.live_stages.contains(&fragment) {
            return Err(BackendError::new("stage handle not alive"));
        }
        self.links += 1;
        let handle = ProgramHandle(self.allocate());
        self.live_programs.insert(handle);
        Ok(handle)
    }

    fn release_stage(&mut self, handle: StageHandle) {
        self.live_stages.remove(&handle);
    }

    fn release_program(&mut self, handle: ProgramHandle) {
        self.live_programs.remove(&handle);
    }
}
