/// Shader source store.
///
/// Owns every shader stage referenced so far: its path, its last good
/// source (split into version line and body), the modification time of
/// the last recompilation attempt, and the backend handle compiled from it.
///
/// Stages are created on first reference and live for the lifetime of the
/// store. They are identified by a `StageId` slot-map key, so program
/// variant keys never depend on memory addresses.
///
/// Staleness checks are pure reads. The stored timestamp only moves in
/// `record_success` / `record_failure`, after a recompilation attempt has
/// been recorded; adopting a new timestamp before that would hide the
/// change forever if the attempt then failed.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use slotmap::{new_key_type, SlotMap};
use crate::backend::{GraphicsBackend, StageHandle, StageKind, StageSource};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::{Error, Result};
use crate::fs::FileSystem;
use crate::utils::VariantCache;
use super::define_set::DefineSet;

// ===== SLOT MAP KEY =====

new_key_type! {
    /// Stable identity of a shader stage within a SourceStore.
    pub struct StageId;
}

// ===== PARSED SOURCE =====

/// Source text split at the version directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSource {
    pub version_line: String,
    pub body: String,
    /// True when the file had no version directive and the default was used
    pub malformed: bool,
    /// True when the file was not valid UTF-8 (invalid sequences replaced)
    pub invalid_utf8: bool,
}

impl ParsedSource {
    /// Split `text` at its first line break when the first line is a `#version` directive.
    ///
    /// Otherwise the whole text is the body and `default_version_line` is used.
    pub fn parse(text: &str, default_version_line: &str) -> Self {
        let (first_line, rest) = match text.find('\n') {
            Some(index) => (&text[..index], &text[index + 1..]),
            None => (text, ""),
        };

        if first_line.trim_start().starts_with("#version") {
            Self {
                version_line: first_line.trim().to_string(),
                body: rest.to_string(),
                malformed: false,
                invalid_utf8: false,
            }
        } else {
            Self {
                version_line: default_version_line.to_string(),
                body: text.to_string(),
                malformed: true,
                invalid_utf8: false,
            }
        }
    }

    /// Parse raw file bytes; invalid UTF-8 is replaced and flagged
    pub fn from_bytes(bytes: &[u8], default_version_line: &str) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::parse(text, default_version_line),
            Err(_) => {
                let mut parsed = Self::parse(&String::from_utf8_lossy(bytes), default_version_line);
                parsed.invalid_utf8 = true;
                parsed
            }
        }
    }

    /// Problems found while parsing, as `MalformedSource` errors
    pub fn problems(&self, resource: &str) -> Vec<Error> {
        let mut problems = Vec::new();
        if self.invalid_utf8 {
            problems.push(Error::MalformedSource {
                resource: resource.to_string(),
                reason: "invalid UTF-8, undecodable bytes replaced".to_string(),
            });
        }
        if self.malformed {
            problems.push(Error::MalformedSource {
                resource: resource.to_string(),
                reason: format!("no version directive, using '{}'", self.version_line),
            });
        }
        problems
    }
}

// ===== STAGE =====

/// One shading-language source file and its current compile state
#[derive(Debug)]
pub struct Stage {
    path: PathBuf,
    kind: StageKind,
    version_line: String,
    body: String,
    last_known_mod_time: SystemTime,
    compiled_handle: Option<StageHandle>,
    just_recompiled: bool,
    /// Set while the file cannot be stat'ed, so the problem is reported once
    missing: bool,
}

impl Stage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn version_line(&self) -> &str {
        &self.version_line
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Modification time of the last recorded compile attempt
    pub fn last_known_mod_time(&self) -> SystemTime {
        self.last_known_mod_time
    }

    /// Handle of the last successful compile (without defines)
    pub fn compiled_handle(&self) -> Option<StageHandle> {
        self.compiled_handle
    }

    /// Whether the stage was recompiled during the current reload cycle
    pub fn just_recompiled(&self) -> bool {
        self.just_recompiled
    }

    /// Whether the stage currently holds a valid compiled handle
    pub fn is_valid(&self) -> bool {
        self.compiled_handle.is_some()
    }

    /// Source for a compile request with the given defines
    pub fn source(&self, defines: &DefineSet) -> StageSource {
        StageSource {
            version_line: self.version_line.clone(),
            define_block: defines.to_block(),
            body: self.body.clone(),
        }
    }

    /// Path as displayed in diagnostics
    pub fn name(&self) -> String {
        self.path.display().to_string()
    }
}

// ===== SOURCE STORE =====

pub struct SourceStore {
    file_system: Arc<dyn FileSystem>,
    default_version_line: String,
    stages: SlotMap<StageId, Stage>,
    /// Path → stage, one stage per path for the store's lifetime
    paths: VariantCache<PathBuf, StageId>,
    /// Stage ids in creation order (round-robin order of the scheduler)
    order: Vec<StageId>,
}

impl SourceStore {
    /// Create an empty store reading through `file_system`
    pub fn new(file_system: Arc<dyn FileSystem>, default_version_line: impl Into<String>) -> Self {
        Self {
            file_system,
            default_version_line: default_version_line.into(),
            stages: SlotMap::with_key(),
            paths: VariantCache::new(),
            order: Vec::new(),
        }
    }

    /// Return the stage for `path`, loading and compiling it on first reference.
    ///
    /// On first reference the file is read, split at its version directive
    /// (a missing directive is reported as MalformedSource and replaced by
    /// the default) and compiled without defines. A compile failure still
    /// creates the stage, without handle, so it is picked up by hot reload
    /// once fixed.
    ///
    /// # Errors
    ///
    /// - `MissingFile` if the file cannot be read on first reference (no stage is created)
    /// - `InvalidResource` if the path was already loaded as another stage kind
    pub fn load(
        &mut self,
        path: impl AsRef<Path>,
        kind: StageKind,
        backend: &mut dyn GraphicsBackend,
        diagnostics: &mut Diagnostics,
    ) -> Result<StageId> {
        let path = path.as_ref();
        if let Some(&id) = self.paths.get(path) {
            let existing = self.stages[id].kind;
            if existing != kind {
                crate::engine_bail!("galaxy3d::SourceStore",
                    "'{}' already loaded as {:?} stage, requested as {:?}",
                    path.display(), existing, kind);
            }
            return Ok(id);
        }

        let (parsed, mod_time) = read_source(
            self.file_system.as_ref(), path, &self.default_version_line)?;
        let name = path.display().to_string();
        report_problems(diagnostics, &parsed, &name);

        let mut stage = Stage {
            path: path.to_path_buf(),
            kind,
            version_line: parsed.version_line,
            body: parsed.body,
            last_known_mod_time: mod_time,
            compiled_handle: None,
            just_recompiled: false,
            missing: false,
        };
        match backend.compile_stage(kind, &stage.source(&DefineSet::new())) {
            Ok(handle) => stage.compiled_handle = Some(handle),
            Err(e) => diagnostics.push(Diagnostic {
                kind: DiagnosticKind::CompileFailure,
                resource: name.clone(),
                message: e.log,
            }),
        }

        let stages = &mut self.stages;
        let order = &mut self.order;
        let id = *self.paths.get_or_create(path.to_path_buf(), |_| {
            let id = stages.insert(stage);
            order.push(id);
            id
        });

        crate::engine_debug!("galaxy3d::SourceStore", "Loaded {:?} stage '{}'", kind, name);
        Ok(id)
    }

    /// Whether the file changed since the last recorded compile attempt.
    ///
    /// Pure read: never updates the stored timestamp.
    ///
    /// # Errors
    ///
    /// - `MissingFile` if the file cannot be stat'ed (retry on the next poll)
    /// - `InvalidResource` for an unknown id
    pub fn is_stale(&self, id: StageId) -> Result<bool> {
        let stage = self.get(id)?;
        let current = self.file_system
            .modification_time(&stage.path)
            .map_err(|e| missing_file(&stage.path, &e))?;
        Ok(current != stage.last_known_mod_time)
    }

    /// Re-read a stage's file without touching the stage.
    ///
    /// The modification time is sampled before reading, so a write racing
    /// with the read shows up as stale on the next poll.
    pub fn read_current(&self, id: StageId) -> Result<(ParsedSource, SystemTime)> {
        let stage = self.get(id)?;
        read_source(self.file_system.as_ref(), &stage.path, &self.default_version_line)
    }

    /// Record a successful recompilation.
    ///
    /// Stores the new source and handle, adopts `mod_time`, sets
    /// `just_recompiled`, and returns the replaced handle for release.
    pub fn record_success(
        &mut self,
        id: StageId,
        mod_time: SystemTime,
        source: ParsedSource,
        handle: StageHandle,
    ) -> Result<Option<StageHandle>> {
        let stage = self.get_mut(id)?;
        stage.version_line = source.version_line;
        stage.body = source.body;
        stage.last_known_mod_time = mod_time;
        stage.just_recompiled = true;
        stage.missing = false;
        Ok(stage.compiled_handle.replace(handle))
    }

    /// Record a definitive compile failure: the previous source and handle
    /// are kept, only the timestamp of the attempt is adopted.
    pub fn record_failure(&mut self, id: StageId, mod_time: SystemTime) -> Result<()> {
        let stage = self.get_mut(id)?;
        stage.last_known_mod_time = mod_time;
        stage.missing = false;
        Ok(())
    }

    /// Flag a stage whose file cannot be read.
    ///
    /// Returns true when the flag changed, i.e. when the problem should be reported.
    pub fn set_missing(&mut self, id: StageId, missing: bool) -> bool {
        match self.stages.get_mut(id) {
            Some(stage) if stage.missing != missing => {
                stage.missing = missing;
                true
            }
            _ => false,
        }
    }

    /// Clear every stage's `just_recompiled` flag
    pub fn clear_recompiled_flags(&mut self) {
        for stage in self.stages.values_mut() {
            stage.just_recompiled = false;
        }
    }

    /// Take every compiled handle out of the store (shutdown)
    pub(crate) fn drain_handles(&mut self) -> Vec<StageHandle> {
        self.stages
            .values_mut()
            .filter_map(|stage| stage.compiled_handle.take())
            .collect()
    }

    // ===== ACCESS =====

    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        self.stages.get(id)
    }

    pub fn stage_id(&self, path: impl AsRef<Path>) -> Option<StageId> {
        self.paths.get(path.as_ref()).copied()
    }

    /// Stage ids in creation order
    pub fn stage_ids(&self) -> &[StageId] {
        &self.order
    }

    pub fn stage_count(&self) -> usize {
        self.order.len()
    }

    /// Version directive substituted for malformed sources
    pub fn default_version_line(&self) -> &str {
        &self.default_version_line
    }

    fn get(&self, id: StageId) -> Result<&Stage> {
        match self.stages.get(id) {
            Some(stage) => Ok(stage),
            None => Err(Error::InvalidResource(format!("unknown stage {:?}", id))),
        }
    }

    fn get_mut(&mut self, id: StageId) -> Result<&mut Stage> {
        match self.stages.get_mut(id) {
            Some(stage) => Ok(stage),
            None => Err(Error::InvalidResource(format!("unknown stage {:?}", id))),
        }
    }
}

// ===== HELPERS =====

fn missing_file(path: &Path, error: &io::Error) -> Error {
    crate::engine_trace!("galaxy3d::SourceStore", "{}: {}", path.display(), error);
    Error::MissingFile(path.display().to_string())
}

pub(crate) fn report_problems(diagnostics: &mut Diagnostics, parsed: &ParsedSource, name: &str) {
    for problem in parsed.problems(name) {
        diagnostics.push_error(&problem);
    }
}

fn read_source(
    file_system: &dyn FileSystem,
    path: &Path,
    default_version_line: &str,
) -> Result<(ParsedSource, SystemTime)> {
    let mod_time = file_system
        .modification_time(path)
        .map_err(|e| missing_file(path, &e))?;
    let bytes = file_system
        .read_file(path)
        .map_err(|e| missing_file(path, &e))?;
    Ok((ParsedSource::from_bytes(&bytes, default_version_line), mod_time))
}

#[cfg(test)]
#[path = "source_store_tests.rs"]
mod tests;
