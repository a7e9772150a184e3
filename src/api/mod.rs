//! API Module
//!
//! HTTP handlers and routing exposing the cache and rate limiter.
//!
//! # Endpoints
//! - `PUT /cache/set` - Store a JSON value
//! - `GET /cache/get/:key` - Retrieve a value by key
//! - `DELETE /cache/del/:key` - Delete a key
//! - `POST /cache/clear` - Drop every entry
//! - `GET /cache/stats` - Cache occupancy
//! - `GET /health` - Health check endpoint
//!
//! Every `/cache` route is rate limited per client identifier.

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
