//! Rate Limit Middleware
//!
//! Gates routes on `RateLimiter::check` and reports quota in response headers.
//! Reads and writes are counted against separate policies.

use axum::{
    extract::{Request, State},
    http::{header::RETRY_AFTER, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use super::handlers::{AppState, RateLimitPolicy};
use crate::models::ErrorResponse;
use crate::ratelimit::identifier_from_request_headers;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please try again later.";

/// Reads the client identifier from `x-forwarded-for` / `x-real-ip`.
pub fn identifier_from_headers(headers: &HeaderMap) -> String {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    identifier_from_request_headers(header("x-forwarded-for"), header("x-real-ip"))
}

/// Gates `get` and `stats` on the read policy.
pub async fn rate_limit_reads(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let policy = state.read_limit;
    enforce(&state, policy, request, next).await
}

/// Gates `set`, `del` and `clear` on the write policy.
pub async fn rate_limit_writes(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let policy = state.write_limit;
    enforce(&state, policy, request, next).await
}

/// Rejects the request with 429 once the caller's window is exhausted.
///
/// Admitted requests get `X-RateLimit-Remaining` and `X-RateLimit-Limit`
/// added to whatever the inner handler returns.
async fn enforce(
    state: &AppState,
    policy: RateLimitPolicy,
    request: Request,
    next: Next,
) -> Response {
    let identifier = identifier_from_headers(request.headers());
    let decision = state
        .limiter
        .check(&policy.key(&identifier), policy.limit, policy.window_ms);

    if !decision.allowed {
        warn!(
            identifier = %identifier,
            scope = policy.scope,
            reset_at = decision.reset_at,
            "Rate limit exceeded"
        );

        let retry_after = decision.retry_after_secs(state.clock.now_ms());
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse::new(RATE_LIMITED_MESSAGE)),
        )
            .into_response();

        let headers = response.headers_mut();
        headers.insert(RETRY_AFTER, HeaderValue::from(retry_after));
        headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(policy.limit));
        headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
        headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset_at));
        return response;
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(policy.limit));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(identifier_from_headers(&headers), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(identifier_from_headers(&headers), "10.0.0.2");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("198.51.100.4, 10.0.0.2"),
        );
        assert_eq!(identifier_from_headers(&headers), "198.51.100.4");
    }
}
