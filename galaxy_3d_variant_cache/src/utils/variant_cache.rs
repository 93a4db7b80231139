/// Generic get-or-create cache.
///
/// A `VariantCache` maps a structural key to a value that is expensive to
/// build. The constructor passed to `get_or_create` runs at most once per
/// distinct key for the lifetime of the cache; only the owning component
/// may force a rebuild through `replace` or `remove`.
///
/// The cache never normalizes keys. Callers canonicalize before lookup
/// (e.g. resolving a defaulted stride) so that equivalent requests collide.
///
/// # Example
///
/// ```ignore
/// let mut cache: VariantCache<String, usize> = VariantCache::new();
/// let a = *cache.get_or_create("lit".to_string(), |k| k.len());  // built
/// let b = *cache.get_or_create("lit".to_string(), |_| unreachable!());
/// assert_eq!(a, b);
/// ```

use std::borrow::Borrow;
use std::collections::hash_map::Entry;
use std::fmt::Debug;
use std::hash::Hash;
use rustc_hash::FxHashMap;
use crate::error::Result;
use super::cache_key::{CacheKey, debug_check_key};

pub struct VariantCache<K, V> {
    entries: FxHashMap<K, V>,
    /// Number of constructor invocations since creation
    constructions: u64,
}

impl<K: CacheKey + Debug, V> VariantCache<K, V> {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
            constructions: 0,
        }
    }

    /// Return the cached value for `key`, constructing it on first request
    pub fn get_or_create<F>(&mut self, key: K, construct: F) -> &V
    where
        F: FnOnce(&K) -> V,
    {
        match self.entries.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                debug_check_key(entry.key());
                self.constructions += 1;
                let value = construct(entry.key());
                entry.insert(value)
            }
        }
    }

    /// Fallible variant of `get_or_create`.
    ///
    /// When the constructor fails nothing is inserted, so the next request
    /// for the same key runs the constructor again.
    pub fn try_get_or_create<F>(&mut self, key: K, construct: F) -> Result<&V>
    where
        F: FnOnce(&K) -> Result<V>,
    {
        match self.entries.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                debug_check_key(entry.key());
                self.constructions += 1;
                let value = construct(entry.key())?;
                Ok(entry.insert(value))
            }
        }
    }

    /// Get a cached value without constructing
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    /// Get a mutable cached value without constructing
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get_mut(key)
    }

    /// Whether a value is cached for `key`
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Replace the value stored for `key`, returning the previous one
    pub fn replace(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    /// Remove the entry for `key`; the next request constructs again
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.remove(key)
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all cached entries (unspecified order)
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    /// Total constructor invocations, including failed ones
    pub fn constructions(&self) -> u64 {
        self.constructions
    }
}

impl<K: CacheKey + Debug, V> Default for VariantCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "variant_cache_tests.rs"]
mod tests;
