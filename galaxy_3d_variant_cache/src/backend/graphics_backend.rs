/// GraphicsBackend trait - compile/link interface consumed by the shader caches
///
/// The caches never talk to a graphics API directly. Everything they need
/// from the backend goes through this trait: compiling one stage from its
/// assembled source, linking two compiled stages into a program, and
/// releasing handles that are no longer referenced.

use std::fmt;

// ============================================================================
// Handles
// ============================================================================

/// Opaque handle to a compiled shader stage owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageHandle(pub u64);

/// Opaque handle to a linked program owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u64);

/// Pipeline stage a source file is compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Vertex shader
    Vertex,
    /// Fragment/Pixel shader
    Fragment,
}

// ============================================================================
// Compile input
// ============================================================================

/// Source of one stage as handed to the backend
///
/// The define block is spliced between the version directive and the
/// body, because `#version` must stay the first line of the shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSource {
    /// First line of the file (`#version ...`)
    pub version_line: String,
    /// `#define` lines, each terminated by `\n` (may be empty)
    pub define_block: String,
    /// Everything after the version line
    pub body: String,
}

impl StageSource {
    /// Full text as compiled by the backend
    pub fn assemble(&self) -> String {
        let mut text = String::with_capacity(
            self.version_line.len() + 1 + self.define_block.len() + self.body.len(),
        );
        text.push_str(&self.version_line);
        text.push('\n');
        text.push_str(&self.define_block);
        text.push_str(&self.body);
        text
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Result type for backend operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Compiler or linker diagnostics returned by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    /// Info log as reported by the driver / shader compiler
    pub log: String,
}

impl BackendError {
    pub fn new(log: impl Into<String>) -> Self {
        Self { log: log.into() }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.log)
    }
}

impl std::error::Error for BackendError {}

// ============================================================================
// GraphicsBackend trait
// ============================================================================

/// Compile/link factory implemented by backend-specific types (GL, Vulkan + glslang...)
///
/// All calls happen on the thread owning the graphics context.
pub trait GraphicsBackend: Send {
    /// Compile one stage
    ///
    /// # Arguments
    ///
    /// * `kind` - Vertex or fragment
    /// * `source` - Version line, define block and body
    fn compile_stage(&mut self, kind: StageKind, source: &StageSource) -> BackendResult<StageHandle>;

    /// Link a vertex and a fragment stage into a program
    fn link_program(&mut self, vertex: StageHandle, fragment: StageHandle) -> BackendResult<ProgramHandle>;

    /// Release a compiled stage
    fn release_stage(&mut self, handle: StageHandle);

    /// Release a linked program
    fn release_program(&mut self, handle: ProgramHandle);
}
