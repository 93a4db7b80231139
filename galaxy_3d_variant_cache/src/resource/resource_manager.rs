/// Central resource manager.
///
/// Owns every cache (shader stages, program variants, buffers, accessors),
/// the hot-reload scheduler and the diagnostics collector. The renderer
/// asks it for program handles and accessors, and calls `tick()` once per
/// frame to let hot reload make progress.
///
/// All state lives here: there is no global cache. The graphics backend is
/// shared with the renderer as `Arc<Mutex<dyn GraphicsBackend>>` and locked
/// for the duration of each call.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use bytemuck::Pod;
use crate::backend::{GraphicsBackend, ProgramHandle, StageKind};
use crate::config::ResourceManagerConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{Error, Result};
use crate::fs::FileSystem;
use crate::shader::{DefineSet, HotReloadScheduler, ProgramCache, ReloadState, SourceStore};
use super::accessor::{Accessor, AccessorCache, AccessorId, ElementType};
use super::buffer_cache::{BufferCache, BufferId};

pub struct ResourceManager {
    backend: Arc<Mutex<dyn GraphicsBackend>>,
    config: ResourceManagerConfig,
    sources: SourceStore,
    programs: ProgramCache,
    scheduler: HotReloadScheduler,
    buffers: BufferCache,
    accessors: AccessorCache,
    diagnostics: Diagnostics,
}

impl ResourceManager {
    /// Create a resource manager with the default configuration
    pub fn new(backend: Arc<Mutex<dyn GraphicsBackend>>, file_system: Arc<dyn FileSystem>) -> Self {
        Self::with_config(backend, file_system, ResourceManagerConfig::default())
    }

    pub fn with_config(
        backend: Arc<Mutex<dyn GraphicsBackend>>,
        file_system: Arc<dyn FileSystem>,
        config: ResourceManagerConfig,
    ) -> Self {
        crate::engine_info!("galaxy3d::ResourceManager",
            "Resource manager created (hot reload {})",
            if config.hot_reload_enabled { "enabled" } else { "disabled" });

        Self {
            backend,
            sources: SourceStore::new(file_system.clone(), config.default_version_line.clone()),
            programs: ProgramCache::new(),
            scheduler: HotReloadScheduler::new(),
            buffers: BufferCache::new(file_system),
            accessors: AccessorCache::new(),
            diagnostics: Diagnostics::new(),
            config,
        }
    }

    // ===== SHADERS =====

    /// Program handle for a vertex/fragment pair compiled with `defines`.
    ///
    /// Stages are loaded on first reference. A build failure returns the
    /// previous handle for the same key when there is one; the failure is
    /// recorded in the diagnostics either way.
    ///
    /// # Errors
    ///
    /// - `MissingFile` if a stage file cannot be read on first reference
    /// - `CompileFailure` / `LinkFailure` if the variant never linked
    /// - `BackendError` if the backend lock is poisoned
    pub fn get_or_create_program(
        &mut self,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
        defines: &DefineSet,
    ) -> Result<ProgramHandle> {
        let mut backend = lock_backend(&self.backend)?;
        let backend = &mut *backend;

        let vertex = self.sources.load(vertex_path, StageKind::Vertex, backend, &mut self.diagnostics)?;
        let fragment = self.sources.load(fragment_path, StageKind::Fragment, backend, &mut self.diagnostics)?;
        self.programs.get_or_create_program(
            &self.sources, backend, vertex, fragment, defines, &mut self.diagnostics)
    }

    /// Advance hot reload by one step.
    ///
    /// With hot reload disabled, ticks only finish relinking after a
    /// `force_full_recompile`; files are never polled.
    pub fn tick(&mut self) -> Result<()> {
        if !self.config.hot_reload_enabled && self.scheduler.state() != ReloadState::UpdateVariants {
            return Ok(());
        }
        let mut backend = lock_backend(&self.backend)?;
        self.scheduler.tick(&mut self.sources, &mut self.programs, &mut *backend, &mut self.diagnostics)
    }

    /// Recompile every stage now; dependent variants relink on the next ticks.
    ///
    /// Works even when hot reload is disabled. Returns the number of
    /// stages recompiled successfully.
    pub fn force_full_recompile(&mut self) -> Result<usize> {
        let mut backend = lock_backend(&self.backend)?;
        self.scheduler.force_full_recompile(&mut self.sources, &mut *backend, &mut self.diagnostics)
    }

    /// Mark every variant using the stage at `path` for rebuild on next request.
    ///
    /// Returns how many variants were marked.
    pub fn invalidate_stage(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        match self.sources.stage_id(path) {
            Some(stage) => Ok(self.programs.invalidate_stage(stage)),
            None => Err(Error::InvalidResource(format!("no stage loaded from '{}'", path.display()))),
        }
    }

    // ===== BUFFERS & ACCESSORS =====

    /// Load a binary buffer (read once per path until released)
    pub fn load_buffer(&mut self, path: impl AsRef<Path>) -> Result<BufferId> {
        self.buffers.load(path)
    }

    /// Accessor for a typed view of `buffer` (stride 0 = tightly packed)
    pub fn get_or_create_accessor(
        &mut self,
        element_type: ElementType,
        buffer: BufferId,
        byte_offset: u64,
        element_count: u32,
        stride: u32,
    ) -> Result<AccessorId> {
        self.accessors.get_or_create(
            &self.buffers, element_type, buffer, byte_offset, element_count, stride)
    }

    pub fn accessor(&self, id: AccessorId) -> Option<&Accessor> {
        self.accessors.accessor(id)
    }

    /// Read element `index` of an accessor as `T`
    ///
    /// # Errors
    ///
    /// `InvalidResource` for an unknown accessor, a released buffer, a
    /// size mismatch between `T` and the element, or an out-of-range index.
    pub fn read_accessor<T: Pod>(&self, id: AccessorId, index: u32) -> Result<T> {
        let Some(accessor) = self.accessors.accessor(id) else {
            crate::engine_bail!("galaxy3d::ResourceManager", "Unknown accessor {:?}", id);
        };
        accessor.read(self.buffers.bytes(accessor.buffer())?, index)
    }

    /// Drop the buffer loaded from `path`; the next load re-reads the file.
    ///
    /// Accessors created against it stay cached, but reading through them fails.
    pub fn release_buffer(&mut self, path: impl AsRef<Path>) -> bool {
        self.buffers.release(path)
    }

    // ===== DIAGNOSTICS =====

    /// Diagnostics recorded since the last `take_diagnostics()`
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.entries()
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    // ===== ACCESS =====

    pub fn config(&self) -> &ResourceManagerConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<Mutex<dyn GraphicsBackend>> {
        &self.backend
    }

    pub fn source_store(&self) -> &SourceStore {
        &self.sources
    }

    pub fn program_cache(&self) -> &ProgramCache {
        &self.programs
    }

    pub fn scheduler(&self) -> &HotReloadScheduler {
        &self.scheduler
    }

    pub fn buffer_cache(&self) -> &BufferCache {
        &self.buffers
    }

    pub fn accessor_cache(&self) -> &AccessorCache {
        &self.accessors
    }
}

impl Drop for ResourceManager {
    fn drop(&mut self) {
        let programs = self.programs.drain_handles();
        let stages = self.sources.drain_handles();
        if programs.is_empty() && stages.is_empty() {
            return;
        }

        // Handles are released even through a poisoned lock
        let mut backend = self.backend.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for handle in &programs {
            backend.release_program(*handle);
        }
        for handle in &stages {
            backend.release_stage(*handle);
        }
        crate::engine_debug!("galaxy3d::ResourceManager",
            "Released {} programs and {} stages", programs.len(), stages.len());
    }
}

fn lock_backend(
    backend: &Arc<Mutex<dyn GraphicsBackend>>,
) -> Result<MutexGuard<'_, dyn GraphicsBackend + 'static>> {
    backend
        .lock()
        .map_err(|_| Error::BackendError("graphics backend lock poisoned".to_string()))
}

#[cfg(test)]
#[path = "resource_manager_tests.rs"]
mod tests;
