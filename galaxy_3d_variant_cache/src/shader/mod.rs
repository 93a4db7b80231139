//! Shader variant module
//!
//! Source store (one stage per file), define sets, the program variant
//! cache and the amortized hot-reload scheduler driving them.

mod define_set;
mod source_store;
mod program_cache;
mod hot_reload;

pub use define_set::DefineSet;
pub use source_store::{ParsedSource, SourceStore, Stage, StageId};
pub use program_cache::{ProgramCache, ProgramVariant, ProgramVariantId, ProgramVariantKey};
pub use hot_reload::{HotReloadScheduler, ReloadState, StageUpdate};
