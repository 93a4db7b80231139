//! Error types for the Galaxy3D variant cache
//!
//! This module defines the error types used by the shader variant cache,
//! the hot-reload scheduler and the buffer/accessor caches.

use std::fmt;

/// Result type for Galaxy3D variant cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D variant cache errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A source or buffer file could not be opened (payload: path)
    MissingFile(String),

    /// Shader source that had to be patched before compiling
    MalformedSource {
        /// Stage path
        resource: String,
        /// What was wrong and what was substituted
        reason: String,
    },

    /// Stage compilation failed in the graphics backend
    CompileFailure {
        /// Stage path or variant description
        resource: String,
        /// Backend diagnostics
        log: String,
    },

    /// Program link failed in the graphics backend
    LinkFailure {
        /// Variant description
        resource: String,
        /// Backend diagnostics
        log: String,
    },

    /// Invalid resource (unknown id, out-of-range view, released buffer...)
    InvalidResource(String),

    /// Backend-specific error (poisoned lock, device lost...)
    BackendError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingFile(path) => write!(f, "Missing file: {}", path),
            Error::MalformedSource { resource, reason } => write!(f, "Malformed source {}: {}", resource, reason),
            Error::CompileFailure { resource, log } => write!(f, "Compile failure in {}: {}", resource, log),
            Error::LinkFailure { resource, log } => write!(f, "Link failure in {}: {}", resource, log),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
