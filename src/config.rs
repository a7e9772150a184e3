//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{DEFAULT_MAX_SIZE, DEFAULT_TTL_MS};
use crate::ratelimit::DEFAULT_SWEEP_INTERVAL_SECS;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub cache_max_entries: usize,
    /// TTL in milliseconds for entries stored without one
    pub cache_default_ttl_ms: u64,
    /// Reads admitted per identifier per window
    pub rate_limit_max: u64,
    /// Read window length in milliseconds
    pub rate_limit_window_ms: u64,
    /// Writes admitted per identifier per window
    pub rate_limit_write_max: u64,
    /// Write window length in milliseconds
    pub rate_limit_write_window_ms: u64,
    /// Rate limit sweep interval in seconds
    pub sweep_interval_secs: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 60000)
    /// - `RATE_LIMIT_MAX` - Reads per window (default: 100)
    /// - `RATE_LIMIT_WINDOW_MS` - Read window in milliseconds (default: 60000)
    /// - `RATE_LIMIT_WRITE_MAX` - Writes per window (default: 20)
    /// - `RATE_LIMIT_WRITE_WINDOW_MS` - Write window in milliseconds (default: 60000)
    /// - `SWEEP_INTERVAL_SECS` - Sweep frequency in seconds (default: 60)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    ///
    /// Rate limit and sweep values of 0 are ignored in favor of the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_max_entries: env_or("CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            cache_default_ttl_ms: env_or("CACHE_DEFAULT_TTL_MS", defaults.cache_default_ttl_ms),
            rate_limit_max: env_positive_or("RATE_LIMIT_MAX", defaults.rate_limit_max),
            rate_limit_window_ms: env_positive_or(
                "RATE_LIMIT_WINDOW_MS",
                defaults.rate_limit_window_ms,
            ),
            rate_limit_write_max: env_positive_or(
                "RATE_LIMIT_WRITE_MAX",
                defaults.rate_limit_write_max,
            ),
            rate_limit_write_window_ms: env_positive_or(
                "RATE_LIMIT_WRITE_WINDOW_MS",
                defaults.rate_limit_write_window_ms,
            ),
            sweep_interval_secs: env_positive_or(
                "SWEEP_INTERVAL_SECS",
                defaults.sweep_interval_secs,
            ),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_max_entries: DEFAULT_MAX_SIZE,
            cache_default_ttl_ms: DEFAULT_TTL_MS,
            rate_limit_max: 100,
            rate_limit_window_ms: 60_000,
            rate_limit_write_max: 20,
            rate_limit_write_window_ms: 60_000,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            server_port: 3000,
        }
    }
}

/// Parses `name` from the environment, falling back on absence or bad input.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Like `env_or`, but a value of 0 also falls back.
fn env_positive_or(name: &str, default: u64) -> u64 {
    match env_or(name, default) {
        0 => default,
        value => value,
    }
}
