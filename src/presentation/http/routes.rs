//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::auth_middleware;
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // WebSocket gateway endpoint, authenticates the upgrade itself
        .route("/gateway", get(ws_handler))
        .route("/health", get(handlers::health::health_check))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes (protected)
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/messages", post(handlers::message::send_message))
        .route(
            "/conversations/{conversation_id}/messages",
            get(handlers::conversation::get_messages),
        )
        .route(
            "/conversations/{conversation_id}/read",
            post(handlers::conversation::mark_read),
        )
        .route(
            "/users/{user_id}/presence",
            get(handlers::presence::get_presence),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
