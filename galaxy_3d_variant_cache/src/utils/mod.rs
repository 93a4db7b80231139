//! Shared cache infrastructure
//!
//! Key utilities and the generic get-or-create cache used by both the
//! shader variant cache and the buffer/accessor caches.

mod cache_key;
mod variant_cache;

pub use cache_key::{CacheKey, structural_hash, debug_check_key};
pub use variant_cache::VariantCache;
