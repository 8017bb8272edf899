//! # box-client
//!
//! Client library for the dots-and-boxes sync protocol.
//!
//! This is the library a front end uses to play against a coordinator.
//!
//! ## Features
//!
//! - **Optimistic moves**: local moves show instantly and are reconciled
//!   against the coordinator's sequence-numbered confirmations
//! - **Transport Abstraction**: Pluggable transport layer (WebSocket, mock)
//! - **Pure State Machine**: Uses box-core for side-effect-free logic
//! - **Collaborator traits**: [`Presenter`] and [`SoundSink`] for rendering
//!   and audio, [`IdentityHub`] for wallet notifications
//!
//! ## Example
//!
//! ```ignore
//! use box_client::{ClientConfig, GameClient, WebSocketTransport};
//!
//! let config = ClientConfig::new("ws://localhost:3001/ws");
//! let client = GameClient::new(config, WebSocketTransport::new());
//!
//! client.connect().await?;
//! client.join(None).await?;
//! client.run(&presenter, &sound, None).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod identity;
pub mod presenter;
pub mod transport;

pub use client::{ClientConfig, ClientError, GameClient};
pub use identity::IdentityHub;
pub use presenter::{dispatch, final_score_line, Presenter, Silent, SoundSink};
pub use transport::{Frame, MockTransport, Transport, TransportError, WebSocketTransport};
