//! Parsed-descriptor caching.
//!
//! Integration code tends to query the same handful of descriptors over
//! and over. The cache keeps an LRU map from normalized descriptor text to
//! the parsed key so each distinct descriptor is parsed once.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use hl7_location::{LocationKey, LocationResult};
use lru::LruCache;

use crate::config::CacheConfig;

struct CacheState {
    keys: LruCache<String, LocationKey>,
    hits: u64,
    misses: u64,
}

/// Thread-safe LRU cache of parsed location descriptors.
///
/// Only successful parses are stored; malformed text is re-parsed (and
/// fails again) on every call.
///
/// # Example
///
/// ```rust
/// use hl7_query::{CacheConfig, DescriptorCache};
///
/// let cache = DescriptorCache::new(CacheConfig { max_entries: 64 });
/// let first = cache.get_or_parse("pid-3.1").unwrap();
/// let second = cache.get_or_parse("PID-3.1").unwrap();
///
/// assert_eq!(first, second);
/// assert_eq!(cache.len(), 1);
/// assert_eq!(cache.stats().hits, 1);
/// ```
pub struct DescriptorCache {
    inner: Mutex<CacheState>,
    capacity: NonZeroUsize,
}

impl DescriptorCache {
    /// Creates a cache with the given configuration.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(CacheState {
                keys: LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
            capacity,
        }
    }

    /// Returns the parsed key for `descriptor`, parsing it on a miss.
    ///
    /// On a hit the entry is promoted to most-recently-used.
    pub fn get_or_parse(&self, descriptor: &str) -> LocationResult<LocationKey> {
        let normalized = normalize_descriptor(descriptor);

        if let Ok(mut state) = self.inner.lock() {
            if let Some(key) = state.keys.get(&normalized).cloned() {
                state.hits += 1;
                tracing::trace!(descriptor = %normalized, "descriptor cache hit");
                return Ok(key);
            }
            state.misses += 1;
        }

        tracing::trace!(descriptor = %normalized, "descriptor cache miss");
        let key = hl7_location::parse(&normalized)?;

        if let Ok(mut state) = self.inner.lock() {
            state.keys.put(normalized, key.clone());
        }
        Ok(key)
    }

    /// Returns true if `descriptor` is cached (without affecting LRU order).
    pub fn contains(&self, descriptor: &str) -> bool {
        match self.inner.lock() {
            Ok(state) => state.keys.contains(&normalize_descriptor(descriptor)),
            _ => false,
        }
    }

    /// Returns the number of cached descriptors.
    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(state) => state.keys.len(),
            _ => 0,
        }
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the maximum number of cached descriptors.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Drops every cached descriptor and resets the counters.
    pub fn clear(&self) {
        if let Ok(mut state) = self.inner.lock() {
            state.keys.clear();
            state.hits = 0;
            state.misses = 0;
        }
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        match self.inner.lock() {
            Ok(state) => CacheStats {
                entries: state.keys.len(),
                hits: state.hits,
                misses: state.misses,
            },
            _ => CacheStats::default(),
        }
    }
}

impl std::fmt::Debug for DescriptorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("DescriptorCache")
            .field("entries", &stats.entries)
            .field("capacity", &self.capacity)
            .field("hits", &stats.hits)
            .field("misses", &stats.misses)
            .finish()
    }
}

/// Statistics about the descriptor cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheStats {
    /// Number of cached descriptors.
    pub entries: usize,
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to parse.
    pub misses: u64,
}

impl CacheStats {
    /// Returns the hit rate as a percentage.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Normalizes descriptor text for consistent cache keys.
///
/// Trims surrounding whitespace and uppercases ASCII letters. Segment
/// names are case-insensitive and the rest of a descriptor is digits and
/// punctuation, so equivalent descriptors share one key.
///
/// # Example
///
/// ```rust
/// use hl7_query::normalize_descriptor;
///
/// assert_eq!(normalize_descriptor("  obx[1]-5 "), "OBX[1]-5");
/// ```
pub fn normalize_descriptor(descriptor: &str) -> String {
    descriptor.trim().to_ascii_uppercase()
}
