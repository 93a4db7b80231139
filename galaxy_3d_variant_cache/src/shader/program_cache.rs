/// Program variant cache.
///
/// Maps (vertex stage, fragment stage, define set) to a linked program
/// handle. Lookups are hash-keyed through a `VariantCache`, so each
/// distinct key owns exactly one `ProgramVariant` for the lifetime of the
/// cache.
///
/// Building a variant compiles both stages with the variant's define
/// block and links them. A variant's handle is never partial: on failure
/// the previous linked handle (if any) stays current, and on success the
/// previous handle is released only after the new one is in place.
///
/// This cache never looks at files. Staleness detection and stage
/// recompilation belong to the hot-reload scheduler, which relinks
/// dependent variants through `relink`.

use slotmap::{new_key_type, SlotMap};
use crate::backend::{GraphicsBackend, ProgramHandle, StageHandle, StageKind};
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::utils::VariantCache;
use super::define_set::DefineSet;
use super::source_store::{SourceStore, Stage, StageId};

// ===== SLOT MAP KEY =====

new_key_type! {
    /// Stable identity of a program variant within a ProgramCache.
    pub struct ProgramVariantId;
}

// ===== KEY =====

/// Structural key of a program variant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramVariantKey {
    pub vertex: StageId,
    pub fragment: StageId,
    pub defines: DefineSet,
}

// ===== VARIANT =====

/// One compiled-and-linked combination of two stages and a define set
#[derive(Debug)]
pub struct ProgramVariant {
    key: ProgramVariantKey,
    handle: Option<ProgramHandle>,
    /// Whether the last build attempt succeeded
    valid: bool,
    /// Rebuild on next request
    dirty: bool,
    last_error: Option<Error>,
    build_count: u32,
}

impl ProgramVariant {
    fn new(key: ProgramVariantKey) -> Self {
        Self {
            key,
            handle: None,
            valid: false,
            dirty: true,
            last_error: None,
            build_count: 0,
        }
    }

    pub fn key(&self) -> &ProgramVariantKey {
        &self.key
    }

    /// Last successfully linked handle
    pub fn handle(&self) -> Option<ProgramHandle> {
        self.handle
    }

    /// Whether the most recent build attempt succeeded
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether the next request rebuilds this variant
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Error of the most recent failed build, cleared on success
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// Number of successful links so far
    pub fn build_count(&self) -> u32 {
        self.build_count
    }
}

// ===== PROGRAM CACHE =====

pub struct ProgramCache {
    variants: SlotMap<ProgramVariantId, ProgramVariant>,
    lookup: VariantCache<ProgramVariantKey, ProgramVariantId>,
    /// Variant ids in creation order (round-robin order of the scheduler)
    order: Vec<ProgramVariantId>,
}

impl ProgramCache {
    pub fn new() -> Self {
        Self {
            variants: SlotMap::with_key(),
            lookup: VariantCache::new(),
            order: Vec::new(),
        }
    }

    /// Return the program for (vertex, fragment, defines), building it if needed.
    ///
    /// A variant is built on first request and after an invalidation.
    /// When a build fails the previous handle is returned if there is one;
    /// the failure is recorded in `diagnostics` either way.
    ///
    /// # Errors
    ///
    /// - `CompileFailure` / `LinkFailure` when no handle was ever linked for this key
    /// - `InvalidResource` for unknown stage ids
    pub fn get_or_create_program(
        &mut self,
        store: &SourceStore,
        backend: &mut dyn GraphicsBackend,
        vertex: StageId,
        fragment: StageId,
        defines: &DefineSet,
        diagnostics: &mut Diagnostics,
    ) -> Result<ProgramHandle> {
        let key = ProgramVariantKey {
            vertex,
            fragment,
            defines: defines.clone(),
        };
        let id = self.variant_id_for(key);

        if self.variants[id].dirty {
            self.build(id, store, backend, diagnostics)?;
        }

        let variant = &self.variants[id];
        match (variant.handle, &variant.last_error) {
            (Some(handle), _) => Ok(handle),
            (None, Some(error)) => Err(error.clone()),
            (None, None) => Err(Error::InvalidResource(
                format!("program variant {:?} has never been built", id))),
        }
    }

    /// Invalidate and rebuild a variant immediately (hot-reload path).
    ///
    /// Returns true if a new handle was linked. On failure the previous
    /// handle stays current and a diagnostic is recorded.
    pub fn relink(
        &mut self,
        id: ProgramVariantId,
        store: &SourceStore,
        backend: &mut dyn GraphicsBackend,
        diagnostics: &mut Diagnostics,
    ) -> Result<bool> {
        self.invalidate(id)?;
        self.build(id, store, backend, diagnostics)
    }

    /// Mark a variant so the next request rebuilds it
    pub fn invalidate(&mut self, id: ProgramVariantId) -> Result<()> {
        match self.variants.get_mut(id) {
            Some(variant) => {
                variant.dirty = true;
                Ok(())
            }
            None => Err(Error::InvalidResource(format!("unknown program variant {:?}", id))),
        }
    }

    /// Mark every variant using `stage`; returns how many were marked
    pub fn invalidate_stage(&mut self, stage: StageId) -> usize {
        let mut count = 0;
        for variant in self.variants.values_mut() {
            if variant.key.vertex == stage || variant.key.fragment == stage {
                variant.dirty = true;
                count += 1;
            }
        }
        count
    }

    /// Whether the scheduler should relink this variant.
    ///
    /// True when either stage was recompiled in the current cycle and both
    /// stages hold a valid handle.
    pub fn needs_relink(&self, id: ProgramVariantId, store: &SourceStore) -> bool {
        let Some(variant) = self.variants.get(id) else {
            return false;
        };
        match (store.stage(variant.key.vertex), store.stage(variant.key.fragment)) {
            (Some(vertex), Some(fragment)) => {
                (vertex.just_recompiled() || fragment.just_recompiled())
                    && vertex.is_valid()
                    && fragment.is_valid()
            }
            _ => false,
        }
    }

    // ===== ACCESS =====

    pub fn variant(&self, id: ProgramVariantId) -> Option<&ProgramVariant> {
        self.variants.get(id)
    }

    /// Id of an existing variant, without building anything
    pub fn find(&self, key: &ProgramVariantKey) -> Option<ProgramVariantId> {
        self.lookup.get(key).copied()
    }

    /// Variant ids in creation order
    pub fn variant_ids(&self) -> &[ProgramVariantId] {
        &self.order
    }

    pub fn variant_count(&self) -> usize {
        self.order.len()
    }

    /// Variants using `stage` as vertex or fragment stage
    pub fn dependents(&self, stage: StageId) -> Vec<ProgramVariantId> {
        self.order
            .iter()
            .copied()
            .filter(|id| {
                let key = &self.variants[*id].key;
                key.vertex == stage || key.fragment == stage
            })
            .collect()
    }

    /// Take every linked handle out of the cache (shutdown)
    pub(crate) fn drain_handles(&mut self) -> Vec<ProgramHandle> {
        self.variants
            .values_mut()
            .filter_map(|variant| {
                variant.valid = false;
                variant.dirty = true;
                variant.handle.take()
            })
            .collect()
    }

    // ===== INTERNAL =====

    fn variant_id_for(&mut self, key: ProgramVariantKey) -> ProgramVariantId {
        let variants = &mut self.variants;
        let order = &mut self.order;
        *self.lookup.get_or_create(key, |key| {
            let id = variants.insert(ProgramVariant::new(key.clone()));
            order.push(id);
            id
        })
    }

    /// Compile both stages with the variant's defines and link them
    fn build(
        &mut self,
        id: ProgramVariantId,
        store: &SourceStore,
        backend: &mut dyn GraphicsBackend,
        diagnostics: &mut Diagnostics,
    ) -> Result<bool> {
        let Some(variant) = self.variants.get_mut(id) else {
            return Err(Error::InvalidResource(format!("unknown program variant {:?}", id)));
        };
        let vertex = stage_of(store, variant.key.vertex)?;
        let fragment = stage_of(store, variant.key.fragment)?;

        variant.dirty = false;
        match link_variant(backend, vertex, fragment, &variant.key.defines) {
            Ok(handle) => {
                let previous = variant.handle.replace(handle);
                variant.valid = true;
                variant.last_error = None;
                variant.build_count += 1;
                if let Some(previous) = previous {
                    backend.release_program(previous);
                }
                crate::engine_debug!("galaxy3d::ProgramCache", "Linked {} -> {:?}",
                    describe(vertex, fragment, &variant.key.defines), handle);
                Ok(true)
            }
            Err(error) => {
                variant.valid = false;
                diagnostics.push_error(&error);
                variant.last_error = Some(error);
                Ok(false)
            }
        }
    }
}

impl Default for ProgramCache {
    fn default() -> Self {
        Self::new()
    }
}

// ===== HELPERS =====

fn stage_of(store: &SourceStore, id: StageId) -> Result<&Stage> {
    match store.stage(id) {
        Some(stage) => Ok(stage),
        None => Err(Error::InvalidResource(format!("unknown stage {:?}", id))),
    }
}

/// Human-readable variant identity used in diagnostics
fn describe(vertex: &Stage, fragment: &Stage, defines: &DefineSet) -> String {
    let mut text = format!("{} + {}", vertex.name(), fragment.name());
    if !defines.is_empty() {
        let list: Vec<String> = defines.iter().map(|(n, v)| format!("{}={}", n, v)).collect();
        text.push_str(&format!(" [{}]", list.join(", ")));
    }
    text
}

fn compile(
    backend: &mut dyn GraphicsBackend,
    stage: &Stage,
    kind: StageKind,
    defines: &DefineSet,
) -> Result<StageHandle> {
    backend
        .compile_stage(kind, &stage.source(defines))
        .map_err(|e| Error::CompileFailure {
            resource: stage.name(),
            log: e.log,
        })
}

/// Compile + link; intermediate stage handles are always released
fn link_variant(
    backend: &mut dyn GraphicsBackend,
    vertex: &Stage,
    fragment: &Stage,
    defines: &DefineSet,
) -> Result<ProgramHandle> {
    let vertex_handle = compile(backend, vertex, StageKind::Vertex, defines)?;
    let fragment_handle = match compile(backend, fragment, StageKind::Fragment, defines) {
        Ok(handle) => handle,
        Err(error) => {
            backend.release_stage(vertex_handle);
            return Err(error);
        }
    };

    let linked = backend.link_program(vertex_handle, fragment_handle);
    backend.release_stage(vertex_handle);
    backend.release_stage(fragment_handle);

    linked.map_err(|e| Error::LinkFailure {
        resource: describe(vertex, fragment, defines),
        log: e.log,
    })
}

#[cfg(test)]
#[path = "program_cache_tests.rs"]
mod tests;
