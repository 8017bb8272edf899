//! HTTP endpoints for dots-server.
//!
//! One router serves the WebSocket endpoint, health checks and metrics.

pub mod health;
mod metrics;

use crate::server::Coordinator;
use crate::ws::ws_handler;
use axum::{routing::get, Extension, Router};
use std::sync::Arc;

pub use health::HealthStatus;

/// Build the router with all endpoints.
///
/// `/metrics` is only mounted when `http.metrics_enabled` is set.
pub fn build_router(coordinator: Arc<Coordinator>) -> Router {
    let config = coordinator.config();
    let mut router = Router::new()
        .route(&config.server.ws_path, get(ws_handler))
        .route("/health", get(health::health_handler));
    if config.http.metrics_enabled {
        router = router.route("/metrics", get(metrics::metrics_handler));
    }
    router.layer(Extension(coordinator))
}
