//! # box-types
//!
//! Wire format types for the dots-and-boxes sync protocol.
//!
//! This crate provides the foundational types used across all crates:
//! - [`Dot`], [`PlayerNumber`], [`RoomId`], [`Seq`] - Addressing and ordering types
//! - [`ClientMessage`], [`ServerMessage`] - Protocol events in both directions
//! - [`GameSnapshot`] - Full-state resync payload
//! - [`WireError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod messages;
mod snapshot;

pub use error::WireError;
pub use ids::{Dot, Outcome, Phase, PlayerNumber, RoomId, Scores, Seq};
pub use messages::{
    BoxCompleted, ClientMessage, DrawLine, ErrorCode, ErrorPayload, GameEnded, IdentityChanged,
    JoinRoom, LineDrawn, RoomJoined, ServerMessage, WireCodec,
};
pub use snapshot::{BoxRecord, GameSnapshot, LineRecord, Seat, DEFAULT_GRID_SIZE};
