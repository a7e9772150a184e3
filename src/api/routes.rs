//! API Routes
//!
//! Configures the Axum router with all endpoints.

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, get_handler, health_handler, set_handler, stats_handler,
    AppState,
};
use super::middleware::{rate_limit_reads, rate_limit_writes};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - Rate limit: `/cache` routes only; reads and writes have separate quotas
///   per client identifier
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let read_routes = Router::new()
        .route("/cache/get/:key", get(get_handler))
        .route("/cache/stats", get(stats_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit_reads));

    let write_routes = Router::new()
        .route("/cache/set", put(set_handler))
        .route("/cache/del/:key", delete(delete_handler))
        .route("/cache/clear", post(clear_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit_writes));

    Router::new()
        .merge(read_routes)
        .merge(write_routes)
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
