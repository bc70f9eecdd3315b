//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_all_handler, clear_handler, delete_handler, get_handler, health_handler,
    invalidate_handler, overall_stats_handler, set_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /cache/:tier/:key` - Store a value
/// - `GET /cache/:tier/:key` - Retrieve a value
/// - `DELETE /cache/:tier/:key` - Delete a key
/// - `DELETE /cache/:tier` - Clear a tier
/// - `DELETE /cache` - Clear every tier
/// - `POST /invalidate` - Delete keys matching a wildcard pattern in every tier
/// - `GET /stats/:tier` - Tier statistics
/// - `GET /stats` - Totals across every tier
/// - `GET /health` - Health check endpoint
///
/// `:tier` is one of `memory`, `disk` or `durable`; anything else is a 400.
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/cache/:tier/:key",
            get(get_handler).put(set_handler).delete(delete_handler),
        )
        .route("/cache/:tier", delete(clear_handler))
        .route("/cache", delete(clear_all_handler))
        .route("/invalidate", post(invalidate_handler))
        .route("/stats/:tier", get(stats_handler))
        .route("/stats", get(overall_stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
