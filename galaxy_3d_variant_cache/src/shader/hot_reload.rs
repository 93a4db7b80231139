/// Amortized hot-reload scheduler.
///
/// Frame-ticked state machine that spreads source polling and relinking
/// across frames: one stage or one variant per `tick()`.
///
/// ```text
/// UnmarkStages ─► UpdateStages (one stage per tick) ─► UpdateVariants (one variant per tick) ─┐
///      ▲                                                                                      │
///      └──────────────────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// A variant is only relinked after a complete stage sweep since the last
/// unmark, so both of its stages have been looked at in the current cycle.

use crate::backend::{GraphicsBackend, StageSource};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::{Error, Result};
use super::program_cache::ProgramCache;
use super::source_store::{report_problems, SourceStore, StageId};

/// Current step of the reload cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadState {
    /// Clear every stage's `just_recompiled` flag
    UnmarkStages,
    /// Poll one stage per tick
    UpdateStages,
    /// Inspect one variant per tick
    UpdateVariants,
}

/// What happened to one stage during a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageUpdate {
    /// File unchanged
    Unchanged,
    /// Recompiled, new handle in place
    Recompiled,
    /// Recompile attempted and failed, previous handle kept
    Failed,
    /// File could not be read, retried on the next poll
    Missing,
}

pub struct HotReloadScheduler {
    state: ReloadState,
    stage_cursor: usize,
    variant_cursor: usize,
    /// Completed UnmarkStages → UpdateVariants cycles
    cycles: u64,
}

impl HotReloadScheduler {
    pub fn new() -> Self {
        Self {
            state: ReloadState::UnmarkStages,
            stage_cursor: 0,
            variant_cursor: 0,
            cycles: 0,
        }
    }

    pub fn state(&self) -> ReloadState {
        self.state
    }

    /// Index of the next stage to poll
    pub fn stage_cursor(&self) -> usize {
        self.stage_cursor
    }

    /// Index of the next variant to inspect
    pub fn variant_cursor(&self) -> usize {
        self.variant_cursor
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Advance the cycle by one step.
    ///
    /// Failures are recorded in `diagnostics` and never stop the cycle;
    /// only unknown ids are returned as errors.
    pub fn tick(
        &mut self,
        store: &mut SourceStore,
        programs: &mut ProgramCache,
        backend: &mut dyn GraphicsBackend,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        match self.state {
            ReloadState::UnmarkStages => {
                store.clear_recompiled_flags();
                self.stage_cursor = 0;
                self.state = ReloadState::UpdateStages;
                self.update_stages_step(store, backend, diagnostics)
            }
            ReloadState::UpdateStages => self.update_stages_step(store, backend, diagnostics),
            ReloadState::UpdateVariants => self.update_variants_step(store, programs, backend, diagnostics),
        }
    }

    /// Unmark and recompile every stage now, then relink from variant 0 on
    /// the following ticks.
    ///
    /// Returns the number of stages recompiled successfully.
    pub fn force_full_recompile(
        &mut self,
        store: &mut SourceStore,
        backend: &mut dyn GraphicsBackend,
        diagnostics: &mut Diagnostics,
    ) -> Result<usize> {
        store.clear_recompiled_flags();

        let ids = store.stage_ids().to_vec();
        let mut recompiled = 0;
        for id in ids {
            if update_stage(store, backend, diagnostics, id, true)? == StageUpdate::Recompiled {
                recompiled += 1;
            }
        }

        crate::engine_info!("galaxy3d::HotReload",
            "Forced recompile: {}/{} stages rebuilt", recompiled, store.stage_count());

        self.stage_cursor = store.stage_count();
        self.variant_cursor = 0;
        self.state = ReloadState::UpdateVariants;
        Ok(recompiled)
    }

    // ===== STEPS =====

    fn update_stages_step(
        &mut self,
        store: &mut SourceStore,
        backend: &mut dyn GraphicsBackend,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        if let Some(&id) = store.stage_ids().get(self.stage_cursor) {
            self.stage_cursor += 1;
            update_stage(store, backend, diagnostics, id, false)?;
        }

        if self.stage_cursor >= store.stage_count() {
            self.variant_cursor = 0;
            self.state = ReloadState::UpdateVariants;
        }
        Ok(())
    }

    fn update_variants_step(
        &mut self,
        store: &mut SourceStore,
        programs: &mut ProgramCache,
        backend: &mut dyn GraphicsBackend,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        if let Some(&id) = programs.variant_ids().get(self.variant_cursor) {
            self.variant_cursor += 1;
            if programs.needs_relink(id, store) {
                programs.relink(id, store, backend, diagnostics)?;
            }
        }

        if self.variant_cursor >= programs.variant_count() {
            self.cycles += 1;
            self.state = ReloadState::UnmarkStages;
        }
        Ok(())
    }
}

impl Default for HotReloadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

// ===== STAGE RECOMPILATION =====

/// Poll one stage and recompile it if stale (or when `force` is set).
///
/// The stored timestamp only moves once the attempt is recorded. A file
/// that cannot be read is reported when it goes missing, not on every poll.
pub(crate) fn update_stage(
    store: &mut SourceStore,
    backend: &mut dyn GraphicsBackend,
    diagnostics: &mut Diagnostics,
    id: StageId,
    force: bool,
) -> Result<StageUpdate> {
    if !force {
        match store.is_stale(id) {
            Ok(true) => {}
            Ok(false) => {
                store.set_missing(id, false);
                return Ok(StageUpdate::Unchanged);
            }
            Err(Error::MissingFile(path)) => return Ok(report_missing(store, diagnostics, id, path)),
            Err(error) => return Err(error),
        }
    }

    let (parsed, mod_time) = match store.read_current(id) {
        Ok(current) => current,
        Err(Error::MissingFile(path)) => return Ok(report_missing(store, diagnostics, id, path)),
        Err(error) => return Err(error),
    };

    let (kind, name) = match store.stage(id) {
        Some(stage) => (stage.kind(), stage.name()),
        None => return Err(Error::InvalidResource(format!("unknown stage {:?}", id))),
    };
    report_problems(diagnostics, &parsed, &name);

    let source = StageSource {
        version_line: parsed.version_line.clone(),
        define_block: String::new(),
        body: parsed.body.clone(),
    };
    match backend.compile_stage(kind, &source) {
        Ok(handle) => {
            if let Some(previous) = store.record_success(id, mod_time, parsed, handle)? {
                backend.release_stage(previous);
            }
            crate::engine_info!("galaxy3d::HotReload", "Recompiled '{}'", name);
            Ok(StageUpdate::Recompiled)
        }
        Err(e) => {
            store.record_failure(id, mod_time)?;
            diagnostics.push(Diagnostic {
                kind: DiagnosticKind::CompileFailure,
                resource: name,
                message: e.log,
            });
            Ok(StageUpdate::Failed)
        }
    }
}

fn report_missing(
    store: &mut SourceStore,
    diagnostics: &mut Diagnostics,
    id: StageId,
    path: String,
) -> StageUpdate {
    if store.set_missing(id, true) {
        diagnostics.push(Diagnostic {
            kind: DiagnosticKind::MissingFile,
            resource: path,
            message: "cannot read file, keeping last good source".to_string(),
        });
    }
    StageUpdate::Missing
}

#[cfg(test)]
#[path = "hot_reload_tests.rs"]
mod tests;
