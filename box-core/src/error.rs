//! Error types for move validation, snapshots and identity.

use box_types::ErrorCode;
use thiserror::Error;

/// Reasons a proposed move is rejected.
///
/// Produced by the validator on both sides of the wire: the client uses it
/// to suppress moves locally, the coordinator turns it into an `error` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    /// Dots are not grid-adjacent, identical, or off the board
    #[error("dots are not adjacent")]
    InvalidEdge,

    /// The edge already has an owner
    #[error("line already drawn")]
    EdgeAlreadyDrawn,

    /// The acting player is not the one to move
    #[error("not your turn")]
    NotYourTurn,

    /// The game is waiting for players or already finished
    #[error("game is not in progress")]
    GameNotInPlayingPhase,

    /// The local client holds no seat
    #[error("not seated in a room")]
    NotSeated,
}

impl MoveError {
    /// Wire code sent to the client that made the move.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidEdge => ErrorCode::InvalidEdge,
            Self::EdgeAlreadyDrawn => ErrorCode::EdgeAlreadyDrawn,
            Self::NotYourTurn => ErrorCode::NotYourTurn,
            Self::GameNotInPlayingPhase => ErrorCode::GameNotInPlayingPhase,
            Self::NotSeated => ErrorCode::NotInRoom,
        }
    }

    /// Whether a client seeing this from the coordinator is out of sync.
    pub fn indicates_desync(&self) -> bool {
        matches!(self, Self::NotYourTurn | Self::GameNotInPlayingPhase)
    }
}

/// A snapshot that cannot be turned back into a game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// Grid size outside the supported range
    #[error("unsupported grid size {0}")]
    GridSize(usize),

    /// A recorded line does not fit the board
    #[error("invalid line in snapshot: {0}")]
    Line(#[source] MoveError),
}

/// Identity collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// No wallet connected when an identity-gated action was attempted
    #[error("identity unavailable: connect a wallet first")]
    IdentityUnavailable,
}
