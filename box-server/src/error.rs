//! Error types for dots-server.

use box_core::MoveError;
use box_types::{ErrorCode, RoomId, ServerMessage, WireError};

use crate::limits::RateLimitError;

/// Main error type for dots-server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Room error.
    #[error("room error: {0}")]
    Room(#[from] RoomError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Problems with what a connection sent.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Frame could not be decoded.
    #[error("invalid message: {0}")]
    Wire(#[from] WireError),

    /// Room-scoped message from a connection without a seat.
    #[error("not in a room: join first")]
    NotInRoom,

    /// Rate limit exceeded.
    #[error("rate limited: {0}")]
    RateLimited(#[from] RateLimitError),
}

impl ProtocolError {
    /// Wire code sent back to the connection.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Wire(_) => ErrorCode::InvalidMessage,
            Self::NotInRoom => ErrorCode::NotInRoom,
            Self::RateLimited(_) => ErrorCode::RateLimited,
        }
    }

    /// The `error` event for this failure.
    pub fn to_message(&self) -> ServerMessage {
        ServerMessage::error(self.code(), self.to_string())
    }
}

/// Room lifecycle and move failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// Both seats are taken.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The room no longer exists.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// The connection no longer holds a seat in the room.
    #[error("not seated in room {0}")]
    NotSeated(RoomId),

    /// The room limit was reached.
    #[error("too many rooms (limit: {limit})")]
    TooManyRooms {
        /// Configured maximum.
        limit: usize,
    },

    /// The rules engine rejected a move.
    #[error(transparent)]
    Move(#[from] MoveError),
}

impl RoomError {
    /// Wire code sent back to the connection.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::RoomFull(_) => ErrorCode::RoomFull,
            Self::RoomNotFound(_) => ErrorCode::RoomNotFound,
            Self::NotSeated(_) => ErrorCode::NotInRoom,
            Self::TooManyRooms { .. } => ErrorCode::TooManyRooms,
            Self::Move(err) => err.code(),
        }
    }

    /// The `error` event for this failure.
    pub fn to_message(&self) -> ServerMessage {
        ServerMessage::error(self.code(), self.to_string())
    }
}

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Result type alias for room operations.
pub type RoomResult<T> = std::result::Result<T, RoomError>;
