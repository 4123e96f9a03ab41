//! Cache Statistics Module
//!
//! Hit/miss and invalidation counters. Informational only: nothing in the
//! read or write path branches on them.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of the cache counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Reads answered from the store
    pub hits: u64,
    /// Reads that found nothing usable
    pub misses: u64,
    /// Successful writes
    pub sets: u64,
    /// Store calls that failed or timed out
    pub store_errors: u64,
    /// Keys removed by pattern invalidation
    pub invalidated_keys: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Cache Metrics ==
/// Lock-free counters shared by every clone of the cache manager.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    store_errors: AtomicU64,
    invalidated_keys: AtomicU64,
}

impl CacheMetrics {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalidated(&self, count: usize) {
        self.invalidated_keys
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            invalidated_keys: self.invalidated_keys.load(Ordering::Relaxed),
        }
    }
}
