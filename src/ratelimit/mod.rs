//! Rate Limit Module
//!
//! Fixed-window admission control per client identifier.

mod entry;
mod identifier;
mod limiter;

pub use entry::{RateLimitDecision, RateLimitEntry};
pub use identifier::{identifier_from_request_headers, UNKNOWN_IDENTIFIER};
pub use limiter::{RateLimiter, WindowTable};

// == Public Constants ==
/// Default period of the background sweep
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
