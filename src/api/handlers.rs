//! API Handlers
//!
//! HTTP request handlers for each endpoint.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::debug;

use crate::cache::TtlCache;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HealthResponse, SetRequest, SetResponse,
    StatsResponse,
};
use crate::ratelimit::RateLimiter;

/// Quota applied by the rate-limit middleware.
///
/// `scope` prefixes the limiter key, so each policy counts in its own bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub scope: &'static str,
    pub limit: u64,
    pub window_ms: u64,
}

impl RateLimitPolicy {
    pub fn reads(limit: u64, window_ms: u64) -> Self {
        Self {
            scope: "read",
            limit,
            window_ms,
        }
    }

    pub fn writes(limit: u64, window_ms: u64) -> Self {
        Self {
            scope: "write",
            limit,
            window_ms,
        }
    }

    /// Limiter key for `identifier` under this policy.
    pub fn key(&self, identifier: &str) -> String {
        format!("{}:{}", self.scope, identifier)
    }
}

/// Application state shared across all handlers.
///
/// The cache sits behind an async RwLock; the limiter locks internally.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<RwLock<TtlCache<Value>>>,
    pub limiter: Arc<RateLimiter>,
    /// Quota for `get` and `stats`
    pub read_limit: RateLimitPolicy,
    /// Quota for `set`, `del` and `clear`
    pub write_limit: RateLimitPolicy,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Creates a new AppState from its parts.
    pub fn new(
        cache: TtlCache<Value>,
        limiter: RateLimiter,
        read_limit: RateLimitPolicy,
        write_limit: RateLimitPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
            limiter: Arc::new(limiter),
            read_limit,
            write_limit,
            clock,
        }
    }

    /// Creates a new AppState from configuration on the system clock.
    pub fn from_config(config: &Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a new AppState from configuration reading time from `clock`.
    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let cache = TtlCache::with_clock(
            config.cache_max_entries,
            config.cache_default_ttl_ms,
            clock.clone(),
        );
        let limiter = RateLimiter::with_clock(clock.clone());
        let read_limit =
            RateLimitPolicy::reads(config.rate_limit_max, config.rate_limit_window_ms);
        let write_limit = RateLimitPolicy::writes(
            config.rate_limit_write_max,
            config.rate_limit_write_window_ms,
        );
        Self::new(cache, limiter, read_limit, write_limit, clock)
    }
}

/// Handler for PUT /cache/set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let mut cache = state.cache.write().await;
    let ttl_ms = req.ttl_ms.unwrap_or_else(|| cache.default_ttl_ms());
    cache.set(req.key.clone(), req.value, ttl_ms);

    Ok(Json(SetResponse::new(req.key, ttl_ms)))
}

/// Handler for GET /cache/get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    // Write lock: a read may purge an expired entry
    let mut cache = state.cache.write().await;
    match cache.get(&key) {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => {
            debug!(key = %key, "Cache miss");
            Err(ApiError::NotFound(key))
        }
    }
}

/// Handler for DELETE /cache/del/:key
///
/// Succeeds whether or not the key was present.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    state.cache.write().await.delete(&key);
    Json(DeleteResponse::new(key))
}

/// Handler for POST /cache/clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.cache.write().await.clear();
    Json(ClearResponse::new())
}

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    Json(StatsResponse::from(cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn test_state() -> (AppState, ManualClock) {
        let clock = ManualClock::new(0);
        let state = AppState::with_clock(&Config::default(), Arc::new(clock.clone()));
        (state, clock)
    }

    fn set_request(key: &str, value: Value, ttl_ms: Option<u64>) -> SetRequest {
        SetRequest {
            key: key.to_string(),
            value,
            ttl_ms,
        }
    }

    #[test]
    fn test_state_carries_separate_policies() {
        let config = Config {
            rate_limit_max: 50,
            rate_limit_write_max: 5,
            rate_limit_write_window_ms: 10_000,
            ..Config::default()
        };
        let state = AppState::from_config(&config);

        assert_eq!(state.read_limit, RateLimitPolicy::reads(50, 60_000));
        assert_eq!(state.write_limit, RateLimitPolicy::writes(5, 10_000));
        assert_ne!(state.read_limit.key("1.2.3.4"), state.write_limit.key("1.2.3.4"));
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let (state, _) = test_state();

        let req = set_request("test_key", Value::from("test_value"), None);
        let response = set_handler(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(response.ttl_ms, 60_000);

        let response = get_handler(State(state), Path("test_key".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, "test_value");
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let (state, _) = test_state();

        let result = get_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_expired_key() {
        let (state, clock) = test_state();

        let req = set_request("short", Value::from(1), Some(100));
        set_handler(State(state.clone()), Json(req)).await.unwrap();
        clock.advance(101);

        let result = get_handler(State(state.clone()), Path("short".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
        assert_eq!(stats_handler(State(state)).await.size, 0);
    }

    #[tokio::test]
    async fn test_delete_handler_is_idempotent() {
        let (state, _) = test_state();

        let req = set_request("to_delete", Value::from("value"), None);
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        delete_handler(State(state.clone()), Path("to_delete".to_string())).await;

        let result = get_handler(State(state), Path("to_delete".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_clear_and_stats_handler() {
        let (state, _) = test_state();

        for key in ["a", "b", "c"] {
            set_handler(State(state.clone()), Json(set_request(key, Value::Null, None)))
                .await
                .unwrap();
        }
        let stats = stats_handler(State(state.clone())).await;
        assert_eq!(stats.size, 3);
        assert_eq!(stats.max_size, 1000);

        clear_handler(State(state.clone())).await;
        assert_eq!(stats_handler(State(state)).await.size, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let (state, _) = test_state();

        let req = set_request("", Value::from("value"), None);
        let result = set_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }
}
