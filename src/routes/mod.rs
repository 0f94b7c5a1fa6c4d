use axum::{Router, http::StatusCode};
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{Ctx, settings::ServerConfig};

pub mod api;

/// Build the application router
pub fn build(ctx: Ctx, server: &ServerConfig) -> Router {
    Router::new()
        .merge(api::mount())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.request_timeout_secs),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
