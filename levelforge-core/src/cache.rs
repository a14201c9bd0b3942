//! Fixed-capacity memo cache with sweep eviction.
//!
//! Inserting into a full cache evicts the oldest `ceil(capacity × fraction)`
//! entries in one sweep (least-recently-used first) rather than one entry
//! per insert.
//!
//! ```text
//!  insert(k) ──▶ len < capacity ? ──yes──▶ put
//!                       │
//!                       no
//!                       ▼
//!             pop_lru × sweep_size ──▶ put
//! ```

use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::debug;

/// A bounded key/value store.
pub struct BoundedCache<K: Hash + Eq, V> {
    entries: LruCache<K, V>,
    sweep_size: usize,
    enabled: bool,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<K: Hash + Eq, V: Clone> BoundedCache<K, V> {
    /// Create a cache holding at most `capacity` entries that evicts
    /// `fraction` of them when full.
    #[must_use]
    pub fn new(capacity: usize, fraction: f64) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        let cap = capacity.get();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let sweep_size = ((cap as f64 * fraction.clamp(0.0, 1.0)).ceil() as usize).clamp(1, cap);
        Self {
            entries: LruCache::new(capacity),
            sweep_size,
            enabled: true,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Look up `key`, promoting it on hit. Always misses when disabled.
    pub fn get(&mut self, key: &K) -> Option<V> {
        if !self.enabled {
            self.misses += 1;
            return None;
        }
        if let Some(v) = self.entries.get(key) {
            self.hits += 1;
            Some(v.clone())
        } else {
            self.misses += 1;
            None
        }
    }

    /// Store `value` under `key`. A no-op when disabled.
    pub fn insert(&mut self, key: K, value: V) {
        if !self.enabled {
            return;
        }
        if !self.entries.contains(&key) && self.entries.len() >= self.capacity() {
            self.sweep();
        }
        self.entries.put(key, value);
    }

    /// Return the cached value or compute, store and return it.
    pub fn get_or_insert_with(&mut self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some(v) = self.get(&key) {
            return v;
        }
        let value = compute();
        self.insert(key, value.clone());
        value
    }

    fn sweep(&mut self) {
        let mut evicted = 0;
        while evicted < self.sweep_size && self.entries.pop_lru().is_some() {
            evicted += 1;
        }
        self.evictions += evicted as u64;
        debug!(evicted, capacity = self.capacity(), "Cache sweep");
    }

    /// Turn caching on or off. Disabling also empties the cache.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.entries.clear();
        }
    }

    /// Whether lookups can hit.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Current number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Entries removed per sweep.
    #[must_use]
    pub fn sweep_size(&self) -> usize {
        self.sweep_size
    }

    /// Snapshot of hit/miss/eviction counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            len: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }
}

/// Counters for one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently held.
    pub len: usize,
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that had to compute.
    pub misses: u64,
    /// Entries removed by sweeps.
    pub evictions: u64,
}

impl CacheStats {
    /// Merge two stat blocks.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        Self {
            len: self.len + other.len,
            hits: self.hits + other.hits,
            misses: self.misses + other.misses,
            evictions: self.evictions + other.evictions,
        }
    }
}
