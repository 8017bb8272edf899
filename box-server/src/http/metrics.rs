//! Prometheus metrics endpoint.

use crate::server::Coordinator;
use axum::{http::header::CONTENT_TYPE, response::IntoResponse, Extension};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Prometheus metrics handler.
///
/// Returns metrics in Prometheus text format.
/// Includes both gauges (current state) and counters (monotonic since startup).
pub async fn metrics_handler(
    Extension(coordinator): Extension<Arc<Coordinator>>,
) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        render(&coordinator),
    )
}

fn render(coordinator: &Coordinator) -> String {
    let m = coordinator.metrics();

    // Gauges
    let rooms = coordinator.total_rooms();
    let players = coordinator.total_players();
    let limiter_keys = coordinator.rate_limits().message_keys_count();

    // Counters
    let connections = m.connections_total.load(Ordering::Relaxed);
    let joins = m.joins_total.load(Ordering::Relaxed);
    let rooms_created = m.rooms_created.load(Ordering::Relaxed);
    let moves_applied = m.moves_applied.load(Ordering::Relaxed);
    let moves_rejected = m.moves_rejected.load(Ordering::Relaxed);
    let games_finished = m.games_finished.load(Ordering::Relaxed);
    let rate_limits = m.rate_limit_hits.load(Ordering::Relaxed);
    let errors = m.errors_total.load(Ordering::Relaxed);

    format!(
        r#"# HELP dots_server_rooms_active Number of live rooms
# TYPE dots_server_rooms_active gauge
dots_server_rooms_active {rooms}

# HELP dots_server_players_active Number of seated players
# TYPE dots_server_players_active gauge
dots_server_players_active {players}

# HELP dots_server_rate_limiter_keys Connections tracked by the rate limiter
# TYPE dots_server_rate_limiter_keys gauge
dots_server_rate_limiter_keys {limiter_keys}

# HELP dots_server_info Server information
# TYPE dots_server_info gauge
dots_server_info{{version="{version}"}} 1

# HELP dots_server_connections_total Total WebSocket connections accepted
# TYPE dots_server_connections_total counter
dots_server_connections_total {connections}

# HELP dots_server_joins_total Total successful joins
# TYPE dots_server_joins_total counter
dots_server_joins_total {joins}

# HELP dots_server_rooms_created_total Total rooms created
# TYPE dots_server_rooms_created_total counter
dots_server_rooms_created_total {rooms_created}

# HELP dots_server_moves_applied_total Total moves applied
# TYPE dots_server_moves_applied_total counter
dots_server_moves_applied_total {moves_applied}

# HELP dots_server_moves_rejected_total Total moves rejected
# TYPE dots_server_moves_rejected_total counter
dots_server_moves_rejected_total {moves_rejected}

# HELP dots_server_games_finished_total Total games played to the end
# TYPE dots_server_games_finished_total counter
dots_server_games_finished_total {games_finished}

# HELP dots_server_rate_limit_hits_total Total rate limit rejections
# TYPE dots_server_rate_limit_hits_total counter
dots_server_rate_limit_hits_total {rate_limits}

# HELP dots_server_errors_total Total protocol errors
# TYPE dots_server_errors_total counter
dots_server_errors_total {errors}
"#,
        version = env!("CARGO_PKG_VERSION"),
    )
}
