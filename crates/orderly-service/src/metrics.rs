//! Prometheus metrics for the order cache.

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Metric names for the service layer.
pub mod names {
    /// Lookups answered from the cache.
    pub const CACHE_HITS_TOTAL: &str = "orderly_cache_hits_total";
    /// Lookups that fell through to the store.
    pub const CACHE_MISSES_TOTAL: &str = "orderly_cache_misses_total";
    /// Entries seeded by the last warm-up.
    pub const CACHE_WARMED_ENTRIES: &str = "orderly_cache_warmed_entries";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(names::CACHE_HITS_TOTAL, "Order lookups served from the cache");
    describe_counter!(
        names::CACHE_MISSES_TOTAL,
        "Order lookups that required a store round-trip"
    );
    describe_gauge!(
        names::CACHE_WARMED_ENTRIES,
        "Orders loaded into the cache by the last warm-up"
    );
}

/// Cache metrics recorder.
#[derive(Clone)]
pub struct CacheMetrics;

impl CacheMetrics {
    pub fn hit() {
        counter!(names::CACHE_HITS_TOTAL).increment(1);
    }

    pub fn miss() {
        counter!(names::CACHE_MISSES_TOTAL).increment(1);
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn warmed(count: usize) {
        gauge!(names::CACHE_WARMED_ENTRIES).set(count as f64);
    }
}
