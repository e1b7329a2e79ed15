//! Resolver metrics.

use metrics::counter;

/// Metric names as constants for consistency.
pub mod names {
    pub const CACHE_HITS_TOTAL: &str = "shortcast_signed_url_cache_hits_total";
    pub const CACHE_MISSES_TOTAL: &str = "shortcast_signed_url_cache_misses_total";
    pub const CACHE_ERRORS_TOTAL: &str = "shortcast_signed_url_cache_errors_total";
    pub const URLS_SIGNED_TOTAL: &str = "shortcast_signed_urls_issued_total";
}

pub fn record_cache_hits(count: usize) {
    counter!(names::CACHE_HITS_TOTAL).increment(count as u64);
}

pub fn record_cache_misses(count: usize) {
    counter!(names::CACHE_MISSES_TOTAL).increment(count as u64);
}

/// Record a cache failure; `op` is the cache operation that failed.
pub fn record_cache_error(op: &'static str) {
    counter!(names::CACHE_ERRORS_TOTAL, "op" => op).increment(1);
}

pub fn record_urls_signed(count: usize) {
    counter!(names::URLS_SIGNED_TOTAL).increment(count as u64);
}
