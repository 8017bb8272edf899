//! Transport abstraction for the game protocol.
//!
//! This module provides a pluggable transport layer that abstracts
//! the underlying connection mechanism (WebSocket, mock for testing).
//!
//! # Design
//!
//! The transport trait is async and connection-oriented:
//! - `connect()` establishes a connection
//! - `send()` transmits one frame
//! - `recv()` receives one frame
//! - `close()` gracefully terminates
//!
//! Frames are either JSON text or MessagePack binary; the coordinator
//! answers in the format of the client's most recent frame.
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.connect("ws://localhost:3001/ws").await?;
//! transport.send(Frame::encode(WireCodec::Json, &msg)?).await?;
//! let reply = transport.recv().await?.decode()?;
//! ```

mod mock;
mod ws;

pub use mock::MockTransport;
pub use ws::WebSocketTransport;

use async_trait::async_trait;
use box_types::{ClientMessage, ServerMessage, WireCodec, WireError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Not connected.
    #[error("not connected")]
    NotConnected,

    /// Connection closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

/// One message on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// JSON text frame
    Text(String),
    /// MessagePack binary frame
    Binary(Vec<u8>),
}

impl Frame {
    /// Encode a message with the given codec.
    pub fn encode<M: Serialize>(codec: WireCodec, message: &M) -> Result<Self, WireError> {
        let bytes = codec.encode(message)?;
        match codec {
            WireCodec::Json => String::from_utf8(bytes)
                .map(Frame::Text)
                .map_err(|e| WireError::InvalidData(e.to_string())),
            WireCodec::MessagePack => Ok(Frame::Binary(bytes)),
        }
    }

    /// Codec this frame was written in.
    pub fn codec(&self) -> WireCodec {
        match self {
            Self::Text(_) => WireCodec::Json,
            Self::Binary(_) => WireCodec::MessagePack,
        }
    }

    /// Decode the frame with its own codec.
    pub fn decode<M: DeserializeOwned>(&self) -> Result<M, WireError> {
        match self {
            Self::Text(text) => WireCodec::Json.decode(text.as_bytes()),
            Self::Binary(bytes) => WireCodec::MessagePack.decode(bytes),
        }
    }

    /// JSON frame for a server message (test and tooling helper).
    pub fn server_json(message: &ServerMessage) -> Result<Self, WireError> {
        Self::encode(WireCodec::Json, message)
    }

    /// Decode as a client message.
    pub fn client_message(&self) -> Result<ClientMessage, WireError> {
        self.decode()
    }
}

/// Transport trait for sending and receiving protocol frames.
///
/// Implementations handle the underlying connection mechanism
/// (WebSocket, mock, etc).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to the coordinator at the given address.
    ///
    /// For WebSocket this is a `ws://` URL. For testing, it's arbitrary.
    async fn connect(&self, address: &str) -> Result<(), TransportError>;

    /// Send one frame.
    async fn send(&self, frame: Frame) -> Result<(), TransportError>;

    /// Receive one frame.
    ///
    /// Blocks until data is available or connection closes. Must be cancel
    /// safe: a frame taken off the connection is returned by the same call.
    async fn recv(&self) -> Result<Frame, TransportError>;

    /// Check if currently connected.
    fn is_connected(&self) -> bool;

    /// Close the connection gracefully.
    async fn close(&self) -> Result<(), TransportError>;
}
