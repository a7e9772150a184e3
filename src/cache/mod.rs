//! Cache Module
//!
//! Provides in-memory caching with lazy TTL expiration and oldest-first
//! capacity eviction.

mod entry;
mod order;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use order::InsertionOrder;
pub use stats::CacheStats;
pub use store::TtlCache;

// == Public Constants ==
/// Default entry cap
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// Default TTL in milliseconds
pub const DEFAULT_TTL_MS: u64 = 60_000;

/// Maximum key length in bytes accepted over HTTP
pub const MAX_KEY_LENGTH: usize = 256;
