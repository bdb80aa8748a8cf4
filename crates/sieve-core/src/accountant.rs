//! Size accounting and hit/miss counters for the filter cache.
//!
//! All counters are plain atomics, so readers never block writers.
//!
//! Racing misses on the same key both charge their bytes, but only one value
//! survives in the map, and only removal of a stored value credits bytes
//! back. `size_in_bytes` can therefore drift above the true footprint.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Aggregate byte counter plus access statistics.
#[derive(Debug, Default)]
pub struct SizeAccountant {
    bytes: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl SizeAccountant {
    /// Creates a zeroed accountant.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Charges a freshly inserted value.
    pub fn add(&self, bytes: usize) {
        self.bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Credits back a removed value.
    pub fn sub(&self, bytes: usize) {
        let bytes = bytes as u64;
        // Saturate: clear() may race with a concurrent charge.
        let _ = self
            .bytes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_sub(bytes))
            });
    }

    /// Total bytes currently charged.
    #[must_use]
    pub fn size_in_bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Record a cache hit.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache miss.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `count` evicted entries.
    pub fn record_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    /// Get hit count.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Get miss count.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Get eviction count.
    #[must_use]
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }
}

/// Point-in-time view of the cache, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Live entries in the map.
    pub entries: usize,
    /// Bytes charged by the accountant.
    pub size_in_bytes: u64,
    /// Segments with a registered retirement listener.
    pub tracked_segments: usize,
    /// Cache hits.
    pub hits: u64,
    /// Cache misses (computations).
    pub misses: u64,
    /// Entries removed by segment retirement or `clear`.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate hit rate (0.0 to 1.0).
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
