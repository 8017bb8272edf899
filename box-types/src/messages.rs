//! Protocol events exchanged between a client and the coordinator.
//!
//! Every event is encoded as `{"event": <name>, "data": <payload>}` where
//! the event names follow the camelCase vocabulary of the protocol
//! (`joinRoom`, `drawLine`, `lineDrawn`, ...).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{Dot, GameSnapshot, PlayerNumber, RoomId, Scores, Seq, WireError};

/// Encoding used for frames on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireCodec {
    /// JSON text frames
    #[default]
    Json,
    /// MessagePack binary frames
    MessagePack,
}

impl WireCodec {
    /// Encode a value with this codec.
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, WireError> {
        match self {
            Self::Json => serde_json::to_vec(value).map_err(WireError::Json),
            Self::MessagePack => rmp_serde::to_vec_named(value).map_err(WireError::Serialization),
        }
    }

    /// Decode a value with this codec.
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, WireError> {
        match self {
            Self::Json => serde_json::from_slice(bytes).map_err(WireError::Json),
            Self::MessagePack => rmp_serde::from_slice(bytes).map_err(WireError::Deserialization),
        }
    }
}

/// Events sent from a client to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Join or create a room
    JoinRoom(JoinRoom),
    /// Propose a move
    DrawLine(DrawLine),
    /// Reset the board, keeping seats
    NewGame,
    /// Ask for a full `gameState` resync
    RequestState,
    /// The player's identity (wallet account) changed
    IdentityChanged(IdentityChanged),
    /// Give up the seat
    LeaveRoom,
}

impl ClientMessage {
    /// Serialize to JSON text.
    pub fn to_json(&self) -> Result<String, WireError> {
        serde_json::to_string(self).map_err(WireError::Json)
    }

    /// Deserialize from JSON text.
    pub fn from_json(text: &str) -> Result<Self, WireError> {
        serde_json::from_str(text).map_err(WireError::Json)
    }

    /// Event name as it appears on the wire.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::JoinRoom(_) => "joinRoom",
            Self::DrawLine(_) => "drawLine",
            Self::NewGame => "newGame",
            Self::RequestState => "requestState",
            Self::IdentityChanged(_) => "identityChanged",
            Self::LeaveRoom => "leaveRoom",
        }
    }
}

/// Request to join a room.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    /// Room to join; a new room is created when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    /// Player identity (wallet address); the coordinator assigns one when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

/// A proposed move: the line between two dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawLine {
    /// One endpoint
    pub start: Dot,
    /// The other endpoint
    pub end: Dot,
    /// Seat making the move
    pub player: PlayerNumber,
}

/// New identity for the sender's seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityChanged {
    /// New identity, or `None` when the wallet disconnected
    #[serde(default)]
    pub identity: Option<String>,
}

/// Events sent from the coordinator to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Room assignment plus initial snapshot
    RoomJoined(RoomJoined),
    /// Full-state resync
    GameState(GameSnapshot),
    /// Authoritative confirmation of an applied edge
    LineDrawn(LineDrawn),
    /// Authoritative box completion, one per box
    BoxCompleted(BoxCompleted),
    /// Terminal notification
    GameEnded(GameEnded),
    /// Rejected request
    Error(ErrorPayload),
}

impl ServerMessage {
    /// Serialize to JSON text.
    pub fn to_json(&self) -> Result<String, WireError> {
        serde_json::to_string(self).map_err(WireError::Json)
    }

    /// Deserialize from JSON text.
    pub fn from_json(text: &str) -> Result<Self, WireError> {
        serde_json::from_str(text).map_err(WireError::Json)
    }

    /// Build an error event.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            code,
            message: message.into(),
            line: None,
        })
    }

    /// An `error` event for a refused `drawLine`, naming the refused line.
    pub fn move_rejected(code: ErrorCode, message: impl Into<String>, line: DrawLine) -> Self {
        Self::Error(ErrorPayload {
            code,
            message: message.into(),
            line: Some(line),
        })
    }

    /// Event name as it appears on the wire.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::RoomJoined(_) => "roomJoined",
            Self::GameState(_) => "gameState",
            Self::LineDrawn(_) => "lineDrawn",
            Self::BoxCompleted(_) => "boxCompleted",
            Self::GameEnded(_) => "gameEnded",
            Self::Error(_) => "error",
        }
    }
}

/// Room assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoined {
    /// Room the client is now seated in
    pub room_id: RoomId,
    /// Seat assigned to the client
    pub player_number: PlayerNumber,
    /// Current state of the room's game
    pub game_state: GameSnapshot,
}

/// An edge the coordinator applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDrawn {
    /// One endpoint
    pub start: Dot,
    /// The other endpoint
    pub end: Dot,
    /// Seat that drew the line
    pub player: PlayerNumber,
    /// Sequence number of the move
    #[serde(default)]
    pub seq: Seq,
}

/// A box the coordinator awarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxCompleted {
    /// Box row (top-left dot)
    pub row: usize,
    /// Box column (top-left dot)
    pub col: usize,
    /// New owner
    pub player: PlayerNumber,
    /// Sequence number of the move that completed it
    #[serde(default)]
    pub seq: Seq,
}

/// Final result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEnded {
    /// `"Player 1"`, `"Player 2"` or `"Draw"`
    pub winner: String,
    /// Final scores
    pub scores: Scores,
}

/// Machine-readable rejection reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Dots are not grid-adjacent or not on the board
    InvalidEdge,
    /// The edge already has an owner
    EdgeAlreadyDrawn,
    /// Move made out of turn
    NotYourTurn,
    /// Move made while the game is not being played
    GameNotInPlayingPhase,
    /// Both seats are taken
    RoomFull,
    /// No such room
    RoomNotFound,
    /// Request needs a seat in a room
    NotInRoom,
    /// The coordinator is at its room capacity
    TooManyRooms,
    /// Frame could not be decoded
    InvalidMessage,
    /// Too many messages
    RateLimited,
    /// Unexpected server fault
    Internal,
}

impl ErrorCode {
    /// Whether this code rejects a `drawLine`.
    pub fn is_move_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidEdge
                | Self::EdgeAlreadyDrawn
                | Self::NotYourTurn
                | Self::GameNotInPlayingPhase
        )
    }
}

/// Error event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Reason code
    pub code: ErrorCode,
    /// Text shown to the user
    pub message: String,
    /// The refused move, for `drawLine` rejections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<DrawLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_line_uses_event_envelope() {
        let msg = ClientMessage::DrawLine(DrawLine {
            start: Dot::new(0, 0),
            end: Dot::new(0, 1),
            player: PlayerNumber::One,
        });

        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value["event"], "drawLine");
        assert_eq!(value["data"]["start"]["row"], 0);
        assert_eq!(value["data"]["end"]["col"], 1);
        assert_eq!(value["data"]["player"], 1);
    }

    #[test]
    fn unit_events_parse_without_data() {
        let parsed = ClientMessage::from_json(r#"{"event":"newGame"}"#).unwrap();
        assert_eq!(parsed, ClientMessage::NewGame);

        let parsed = ClientMessage::from_json(r#"{"event":"requestState"}"#).unwrap();
        assert_eq!(parsed, ClientMessage::RequestState);
    }

    #[test]
    fn join_room_fields_are_optional() {
        let parsed = ClientMessage::from_json(r#"{"event":"joinRoom","data":{}}"#).unwrap();
        assert_eq!(parsed, ClientMessage::JoinRoom(JoinRoom::default()));

        let parsed =
            ClientMessage::from_json(r#"{"event":"joinRoom","data":{"roomId":"abc"}}"#).unwrap();
        match parsed {
            ClientMessage::JoinRoom(join) => {
                assert_eq!(join.room_id.unwrap().as_str(), "abc");
                assert!(join.identity.is_none());
            }
            other => panic!("expected joinRoom, got {other:?}"),
        }
    }

    #[test]
    fn join_room_rejects_invalid_room_id() {
        assert!(ClientMessage::from_json(r#"{"event":"joinRoom","data":{"roomId":"a b"}}"#).is_err());
    }

    #[test]
    fn unknown_event_is_rejected() {
        assert!(ClientMessage::from_json(r#"{"event":"boxCompleted","data":{}}"#).is_err());
    }

    #[test]
    fn game_ended_matches_protocol_shape() {
        let msg = ServerMessage::GameEnded(GameEnded {
            winner: "Player 1".into(),
            scores: Scores {
                player1: 5,
                player2: 4,
            },
        });

        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value["event"], "gameEnded");
        assert_eq!(value["data"]["winner"], "Player 1");
        assert_eq!(value["data"]["scores"]["player1"], 5);
        assert_eq!(value["data"]["scores"]["player2"], 4);
    }

    #[test]
    fn error_event_carries_code_and_message() {
        let msg = ServerMessage::error(ErrorCode::NotYourTurn, "not your turn");
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"event\":\"error\""));
        assert!(json.contains("\"code\":\"not_your_turn\""));
        assert!(json.contains("\"message\":\"not your turn\""));
        assert!(!json.contains("\"line\""));
    }

    #[test]
    fn move_rejection_names_the_refused_line() {
        let line = DrawLine {
            start: Dot::new(1, 1),
            end: Dot::new(1, 2),
            player: PlayerNumber::Two,
        };
        let msg = ServerMessage::move_rejected(ErrorCode::EdgeAlreadyDrawn, "taken", line);

        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value["data"]["code"], "edge_already_drawn");
        assert_eq!(value["data"]["line"]["start"]["row"], 1);
        assert_eq!(value["data"]["line"]["player"], 2);

        let parsed = ServerMessage::from_json(&msg.to_json().unwrap()).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn line_drawn_without_seq_defaults_to_zero() {
        let parsed = ServerMessage::from_json(
            r#"{"event":"lineDrawn","data":{"start":{"row":1,"col":1},"end":{"row":1,"col":2},"player":2}}"#,
        )
        .unwrap();
        match parsed {
            ServerMessage::LineDrawn(line) => {
                assert_eq!(line.player, PlayerNumber::Two);
                assert_eq!(line.seq, Seq::zero());
            }
            other => panic!("expected lineDrawn, got {other:?}"),
        }
    }

    #[test]
    fn messagepack_codec_decodes_what_it_encodes() {
        let msg = ServerMessage::BoxCompleted(BoxCompleted {
            row: 1,
            col: 2,
            player: PlayerNumber::Two,
            seq: Seq::new(7),
        });

        let bytes = WireCodec::MessagePack.encode(&msg).unwrap();
        let restored: ServerMessage = WireCodec::MessagePack.decode(&bytes).unwrap();
        assert_eq!(restored, msg);
    }

    #[test]
    fn event_names_match_serialized_tags() {
        let msgs = [
            ClientMessage::NewGame,
            ClientMessage::RequestState,
            ClientMessage::LeaveRoom,
            ClientMessage::JoinRoom(JoinRoom::default()),
        ];
        for msg in msgs {
            let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
            assert_eq!(value["event"], msg.event_name());
        }
    }

    #[test]
    fn move_rejection_codes() {
        assert!(ErrorCode::EdgeAlreadyDrawn.is_move_rejection());
        assert!(ErrorCode::InvalidEdge.is_move_rejection());
        assert!(!ErrorCode::RoomFull.is_move_rejection());
    }
}
