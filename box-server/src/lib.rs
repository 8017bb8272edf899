//! # dots-server
//!
//! Session coordinator for dots-and-boxes.
//!
//! This crate implements the authoritative side of the game:
//! - Accepts WebSocket connections and seats up to two players per room
//! - Applies moves one at a time per room and broadcasts the results
//! - Answers resync requests with full snapshots
//! - Removes idle rooms in the background
//!
//! ## Architecture
//!
//! ```text
//! Player 1 ──┐                      ┌── Player 2
//!            │   WebSocket (/ws)    │
//!            ├─────────────────────►│
//!            │                      │
//!        ┌───┴──────────────────────┴───┐
//!        │          dots-server         │
//!        │  ┌────────────────────────┐  │
//!        │  │ rooms: Mutex<Room> each│  │
//!        │  └────────────────────────┘  │
//!        └──────────────────────────────┘
//! ```
//!
//! ## Protocol
//!
//! Frames are `{"event": ..., "data": ...}` JSON text or the same shape in
//! MessagePack binary:
//! - joinRoom → roomJoined (seat + snapshot)
//! - drawLine → lineDrawn, boxCompleted*, gameEnded? (broadcast) or error
//! - newGame, leaveRoom, identityChanged → gameState (broadcast)
//! - requestState → gameState

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cleanup;
pub mod config;
pub mod error;
pub mod http;
pub mod limits;
pub mod room;
pub mod server;
pub mod session;
pub mod ws;

pub use config::Config;
pub use error::ServerError;
pub use server::Coordinator;

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Validate `config`, bind, and serve until `shutdown` resolves.
///
/// Starts the idle-room cleanup task alongside the listener.
pub async fn run(
    config: Config,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> error::Result<()> {
    config.validate()?;
    let listener = TcpListener::bind(config.server.bind_address.as_str()).await?;
    tracing::info!(
        "dots-server listening on {} (ws: {})",
        listener.local_addr()?,
        config.server.ws_path
    );

    let cleanup_config = config.cleanup.clone();
    let coordinator = Arc::new(Coordinator::new(config));
    let cleanup = cleanup::spawn_cleanup_task(coordinator.clone(), cleanup_config);

    let result = serve(listener, coordinator, shutdown).await;
    cleanup.abort();
    result.map_err(ServerError::from)
}

/// Serve the router on an already bound listener until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    coordinator: Arc<Coordinator>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    http::health::init_start_time();
    let app = http::build_router(coordinator);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
