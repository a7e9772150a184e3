//! Cache Statistics Module
//!
//! Snapshot of cache occupancy for monitoring.

use serde::Serialize;

// == Cache Stats ==
/// Occupancy snapshot returned by `TtlCache::stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Tracked entries, including expired ones not yet purged
    pub size: usize,
    /// Configured entry cap
    pub max_size: usize,
}

impl CacheStats {
    pub fn new(size: usize, max_size: usize) -> Self {
        Self { size, max_size }
    }

    // == Fill Ratio ==
    /// Returns size / max_size, or 0.0 for a zero-capacity cache.
    pub fn fill_ratio(&self) -> f64 {
        if self.max_size == 0 {
            0.0
        } else {
            self.size as f64 / self.max_size as f64
        }
    }
}
