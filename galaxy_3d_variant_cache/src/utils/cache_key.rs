/// Structural equality and hashing helpers for composite cache keys.
///
/// Cache keys are compared by content (derived `Eq` + `Hash`), never by
/// address. Keys that reference other resources do so through slot-map
/// keys, which stay valid as the backing arenas grow.

use std::hash::{BuildHasher, Hash};
use rustc_hash::FxBuildHasher;

/// Marker for types usable as a `VariantCache` key
pub trait CacheKey: Hash + Eq + Clone {}

impl<T: Hash + Eq + Clone> CacheKey for T {}

/// FxHash of a key (same hasher as the cache maps)
pub fn structural_hash<K: Hash + ?Sized>(key: &K) -> u64 {
    FxBuildHasher.hash_one(key)
}

/// Verify that a key equals and hashes like its own clone.
///
/// A key failing this check would let one logical key construct several
/// values. That is a programming defect, so debug builds panic.
#[inline]
pub fn debug_check_key<K: CacheKey + std::fmt::Debug>(key: &K) {
    if cfg!(debug_assertions) {
        let copy = key.clone();
        assert!(
            copy == *key && structural_hash(&copy) == structural_hash(key),
            "invariant violation: cache key {:?} is not structurally consistent",
            key
        );
    }
}

#[cfg(test)]
#[path = "cache_key_tests.rs"]
mod tests;
