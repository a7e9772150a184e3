//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub data: V,
    /// Write timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Lifetime in milliseconds, measured from `stored_at`
    pub ttl_ms: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry written at `now_ms`.
    pub fn new(data: V, now_ms: u64, ttl_ms: u64) -> Self {
        Self {
            data,
            stored_at: now_ms,
            ttl_ms,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// Boundary condition: an entry is still readable when exactly `ttl_ms`
    /// has elapsed and expires one millisecond later.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.stored_at) > self.ttl_ms
    }
}
