//! TTL Cache Module
//!
//! HashMap storage with insertion-order capacity eviction and lazy TTL expiry.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, InsertionOrder, DEFAULT_MAX_SIZE, DEFAULT_TTL_MS};
use crate::clock::{Clock, SystemClock};

// == TTL Cache ==
/// Bounded key/value cache with per-entry expiry.
///
/// Expired entries are only purged when read. Until then they still count
/// towards `max_size`. When full, `set` evicts the key that was inserted
/// first; neither reads nor overwrites change that order.
#[derive(Debug)]
pub struct TtlCache<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// First-insertion order, oldest at the front
    order: InsertionOrder,
    /// Maximum number of tracked entries
    max_size: usize,
    /// TTL applied by `set_default`
    default_ttl_ms: u64,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    // == Constructors ==
    /// Creates a cache with 1000 entries, a 60 second default TTL and the
    /// system clock.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_SIZE, DEFAULT_TTL_MS)
    }

    /// Creates a cache with the given cap and default TTL on the system clock.
    pub fn with_capacity(max_size: usize, default_ttl_ms: u64) -> Self {
        Self::with_clock(max_size, default_ttl_ms, Arc::new(SystemClock))
    }

    /// Creates a cache reading time from `clock`.
    pub fn with_clock(max_size: usize, default_ttl_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            max_size,
            default_ttl_ms,
            clock,
        }
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl_ms` milliseconds.
    ///
    /// At capacity one entry is evicted first, even when `key` is already
    /// present. The victim is the earliest inserted key, which may be `key`
    /// itself; in that case it is re-inserted as the newest.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl_ms: u64) {
        let key = key.into();
        let now = self.clock.now_ms();

        if self.entries.len() >= self.max_size {
            if let Some(evicted_key) = self.order.evict_oldest() {
                self.entries.remove(&evicted_key);
                debug!(key = %evicted_key, "Cache full, evicted oldest entry");
            }
        }

        let entry = CacheEntry::new(value, now, ttl_ms);
        if self.entries.insert(key.clone(), entry).is_none() {
            self.order.push(&key);
        }
    }

    /// Stores `value` with the configured default TTL.
    pub fn set_default(&mut self, key: impl Into<String>, value: V) {
        let ttl_ms = self.default_ttl_ms;
        self.set(key, value, ttl_ms);
    }

    // == Get ==
    /// Returns a clone of the value if present and unexpired.
    ///
    /// An expired entry is removed on the way out.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();
        let expired = self.entries.get(key)?.is_expired(now);

        if expired {
            self.remove_entry(key);
            return None;
        }

        self.entries.get(key).map(|entry| entry.data.clone())
    }

    // == Delete ==
    /// Removes an entry by key. Absent keys are ignored.
    pub fn delete(&mut self, key: &str) {
        self.remove_entry(key);
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    // == Stats ==
    /// Returns tracked entry count and configured cap.
    pub fn stats(&self) -> CacheStats {
        CacheStats::new(self.entries.len(), self.max_size)
    }

    /// Returns the TTL used by `set_default`.
    pub fn default_ttl_ms(&self) -> u64 {
        self.default_ttl_ms
    }

    // == Length ==
    /// Returns the current number of tracked entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_entry(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.order.remove(key);
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
