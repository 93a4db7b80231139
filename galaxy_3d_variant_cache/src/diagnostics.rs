//! Structured diagnostics channel
//!
//! File, compile and link problems never abort the process. They are
//! recorded here (kind + resource identity + message), logged, and left
//! for the caller to drain with `take()`.

use std::fmt;
use crate::error::Error;

/// Category of a recorded problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// File could not be opened or stat'ed
    MissingFile,
    /// Source without version directive or with invalid UTF-8
    MalformedSource,
    /// Stage compilation failed
    CompileFailure,
    /// Program link failed
    LinkFailure,
}

/// One recorded problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Path or variant description
    pub resource: String,
    pub message: String,
}

impl Diagnostic {
    /// Build a diagnostic from an error, if the error belongs to the channel
    pub fn from_error(error: &Error) -> Option<Self> {
        let (kind, resource, message) = match error {
            Error::MissingFile(path) => (DiagnosticKind::MissingFile, path.clone(), error.to_string()),
            Error::MalformedSource { resource, reason } => (DiagnosticKind::MalformedSource, resource.clone(), reason.clone()),
            Error::CompileFailure { resource, log } => (DiagnosticKind::CompileFailure, resource.clone(), log.clone()),
            Error::LinkFailure { resource, log } => (DiagnosticKind::LinkFailure, resource.clone(), log.clone()),
            Error::InvalidResource(_) | Error::BackendError(_) => return None,
        };
        Some(Self { kind, resource, message })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.kind, self.resource, self.message)
    }
}

/// Collector for diagnostics, owned by the resource manager
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it
    ///
    /// Missing files and malformed sources are warnings, compile and
    /// link failures are errors.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.kind {
            DiagnosticKind::MissingFile | DiagnosticKind::MalformedSource => {
                crate::engine_warn!("galaxy3d::Diagnostics", "{}", diagnostic);
            }
            DiagnosticKind::CompileFailure | DiagnosticKind::LinkFailure => {
                crate::engine_error!("galaxy3d::Diagnostics", "{}", diagnostic);
            }
        }
        self.entries.push(diagnostic);
    }

    /// Record an error if it belongs to the diagnostics channel
    ///
    /// Returns false for errors that are not diagnostics (they are only logged).
    pub fn push_error(&mut self, error: &Error) -> bool {
        match Diagnostic::from_error(error) {
            Some(diagnostic) => {
                self.push(diagnostic);
                true
            }
            None => {
                crate::engine_error!("galaxy3d::Diagnostics", "{}", error);
                false
            }
        }
    }

    /// Diagnostics recorded since the last `take()`
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Drain all recorded diagnostics
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "diagnostics_tests.rs"]
mod tests;
