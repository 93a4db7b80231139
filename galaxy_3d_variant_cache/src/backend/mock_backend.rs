/// Mock GraphicsBackend for unit tests (no GPU required)
///
/// Hands out sequential handles and tracks every call so tests can check
/// what was compiled, linked and released. A stage whose body contains
/// `#error` fails to compile, mirroring the GLSL preprocessor directive.

use rustc_hash::FxHashSet;
use super::{
    GraphicsBackend, BackendError, BackendResult,
    StageHandle, ProgramHandle, StageKind, StageSource,
};

/// Mock backend that tracks created handles without GPU
#[derive(Debug, Default)]
pub struct MockBackend {
    /// Next handle value (shared by stages and programs so values never collide)
    next_handle: u64,
    /// Assembled sources of every compile request, in call order
    pub compiled_sources: Vec<(StageKind, String)>,
    /// Every successful link, in call order
    pub linked_programs: Vec<(StageHandle, StageHandle, ProgramHandle)>,
    /// Stage handles currently alive
    pub live_stages: FxHashSet<StageHandle>,
    /// Program handles currently alive
    pub live_programs: FxHashSet<ProgramHandle>,
    /// Programs released so far, in call order
    pub released_programs: Vec<ProgramHandle>,
    /// When set, every link request fails
    pub fail_links: bool,
}

impl MockBackend {
    /// Create a new mock backend
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            ..Default::default()
        }
    }

    /// Number of compile requests (successful or not)
    pub fn compile_count(&self) -> usize {
        self.compiled_sources.len()
    }

    /// Number of successful links
    pub fn link_count(&self) -> usize {
        self.linked_programs.len()
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_handle.max(1);
        self.next_handle = id + 1;
        id
    }
}

impl GraphicsBackend for MockBackend {
    fn compile_stage(&mut self, kind: StageKind, source: &StageSource) -> BackendResult<StageHandle> {
        self.compiled_sources.push((kind, source.assemble()));
        if source.body.contains("#error") {
            return Err(BackendError::new(format!("0:1: {:?} stage: '#error' directive", kind)));
        }
        let handle = StageHandle(self.allocate());
        self.live_stages.insert(handle);
        Ok(handle)
    }

    fn link_program(&mut self, vertex: StageHandle, fragment: StageHandle) -> BackendResult<ProgramHandle> {
        if self.fail_links {
            return Err(BackendError::new("link error: interface mismatch"));
        }
        if !self.live_stages.contains(&vertex) || !self.live_stages.contains(&fragment) {
            return Err(BackendError::new("link error: stage handle not alive"));
        }
        let handle = ProgramHandle(self.allocate());
        self.live_programs.insert(handle);
        self.linked_programs.push((vertex, fragment, handle));
        Ok(handle)
    }

    fn release_stage(&mut self, handle: StageHandle) {
        self.live_stages.remove(&handle);
    }

    fn release_program(&mut self, handle: ProgramHandle) {
        self.live_programs.remove(&handle);
        self.released_programs.push(handle);
    }
}

#[cfg(test)]
#[path = "mock_backend_tests.rs"]
mod tests;
