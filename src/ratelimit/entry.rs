//! Rate Limit Entry Module
//!
//! Per-identifier window state and the decision handed back to callers.

use serde::Serialize;

// == Rate Limit Entry ==
/// Requests accepted in the current fixed window for one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    /// Requests admitted in this window
    pub count: u64,
    /// Window end (Unix milliseconds)
    pub reset_at: u64,
}

impl RateLimitEntry {
    /// Opens a window at `now_ms` with the current request already counted.
    pub fn fresh(now_ms: u64, window_ms: u64) -> Self {
        Self {
            count: 1,
            reset_at: now_ms.saturating_add(window_ms),
        }
    }

    /// A window is over once `now_ms` is strictly past `reset_at`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.reset_at
    }
}

// == Rate Limit Decision ==
/// Result of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests still admissible in this window
    pub remaining: u64,
    /// Window end (Unix milliseconds)
    pub reset_at: u64,
}

impl RateLimitDecision {
    pub fn allowed(remaining: u64, reset_at: u64) -> Self {
        Self {
            allowed: true,
            remaining,
            reset_at,
        }
    }

    pub fn denied(reset_at: u64) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            reset_at,
        }
    }

    // == Retry After ==
    /// Whole seconds until the window resets, rounded up. Suitable for a
    /// `Retry-After` header.
    pub fn retry_after_secs(&self, now_ms: u64) -> u64 {
        self.reset_at.saturating_sub(now_ms).div_ceil(1000)
    }
}
