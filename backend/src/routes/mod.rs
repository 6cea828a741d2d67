//! Route definitions for the advisory server

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/capabilities", get(handlers::capabilities))
        .nest("/advisory", advisory_routes())
        .route("/telemetry", get(handlers::get_telemetry))
        .route("/locations", get(handlers::list_locations))
}

/// Advisory query routes
fn advisory_routes() -> Router<AppState> {
    Router::new().route("/query", post(handlers::submit_query))
}
