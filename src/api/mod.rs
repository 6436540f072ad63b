//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All resource endpoints are mounted under `/api/v1`. `/health`,
//! `/openapi.json` and `/ws` live at the root.

pub mod dto;
pub mod handlers;
pub mod openapi;

use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
        .merge(openapi::router())
}

/// Builds the full application: REST, WebSocket, and middleware.
///
/// `request_timeout` bounds REST requests only; the WebSocket upgrade
/// response is returned immediately and the socket outlives it.
pub fn app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(build_router())
        .layer(TimeoutLayer::new(request_timeout))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
