//! Memo Gate - in-memory TTL cache and fixed-window rate limiter
//!
//! Two independent primitives for request handlers: a bounded cache with
//! lazy expiry, and a per-identifier request counter with a background sweep.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod ratelimit;
pub mod tasks;

pub use api::AppState;
pub use cache::TtlCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use ratelimit::{identifier_from_request_headers, RateLimitDecision, RateLimiter};
