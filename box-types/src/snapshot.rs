//! Full-state snapshot sent in `roomJoined` and `gameState`.

use serde::{Deserialize, Serialize};

use crate::{Dot, Phase, PlayerNumber, Scores, Seq};

/// Dots per side of the default board.
pub const DEFAULT_GRID_SIZE: usize = 5;

fn default_grid_size() -> usize {
    DEFAULT_GRID_SIZE
}

fn default_current_player() -> PlayerNumber {
    PlayerNumber::One
}

/// Authoritative game state at one sequence number.
///
/// The first three fields are the minimal resync payload
/// (`currentPlayer`, `scores`, `state`). The rest let a client rebuild
/// its board mirror without replaying history; older peers that omit
/// them still parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    /// Seat to move
    #[serde(default = "default_current_player")]
    pub current_player: PlayerNumber,
    /// Box counts
    #[serde(default)]
    pub scores: Scores,
    /// Game phase
    #[serde(default)]
    pub state: Phase,
    /// Dots per side
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,
    /// Sequence number of the last applied move
    #[serde(default)]
    pub seq: Seq,
    /// Every drawn edge, in the order they were applied
    #[serde(default)]
    pub lines: Vec<LineRecord>,
    /// Every owned box
    #[serde(default)]
    pub boxes: Vec<BoxRecord>,
    /// Occupied seats
    #[serde(default)]
    pub players: Vec<Seat>,
}

impl GameSnapshot {
    /// Snapshot of a fresh board with no seats.
    pub fn empty(grid_size: usize) -> Self {
        Self {
            current_player: PlayerNumber::One,
            scores: Scores::default(),
            state: Phase::Waiting,
            grid_size,
            seq: Seq::zero(),
            lines: Vec::new(),
            boxes: Vec::new(),
            players: Vec::new(),
        }
    }

    /// Identity recorded for a seat, if the seat is taken and identified.
    pub fn identity_of(&self, player: PlayerNumber) -> Option<&str> {
        self.players
            .iter()
            .find(|seat| seat.player == player)
            .and_then(|seat| seat.identity.as_deref())
    }
}

/// One drawn edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRecord {
    /// Normalized first endpoint
    pub start: Dot,
    /// Normalized second endpoint
    pub end: Dot,
    /// Owner
    pub player: PlayerNumber,
}

/// One owned box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxRecord {
    /// Box row
    pub row: usize,
    /// Box column
    pub col: usize,
    /// Owner
    pub player: PlayerNumber,
}

/// An occupied seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// Seat number
    pub player: PlayerNumber,
    /// Wallet address or session id
    #[serde(default)]
    pub identity: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_payload_parses_with_defaults() {
        let snapshot: GameSnapshot = serde_json::from_str(
            r#"{"currentPlayer":2,"scores":{"player1":1,"player2":0},"state":"playing"}"#,
        )
        .unwrap();

        assert_eq!(snapshot.current_player, PlayerNumber::Two);
        assert_eq!(snapshot.scores.player1, 1);
        assert_eq!(snapshot.state, Phase::Playing);
        assert_eq!(snapshot.grid_size, DEFAULT_GRID_SIZE);
        assert_eq!(snapshot.seq, Seq::zero());
        assert!(snapshot.lines.is_empty());
    }

    #[test]
    fn fields_use_camel_case() {
        let json = serde_json::to_string(&GameSnapshot::empty(3)).unwrap();
        assert!(json.contains("\"currentPlayer\":1"));
        assert!(json.contains("\"gridSize\":3"));
        assert!(json.contains("\"state\":\"waiting\""));
    }

    #[test]
    fn identity_lookup_by_seat() {
        let mut snapshot = GameSnapshot::empty(5);
        snapshot.players.push(Seat {
            player: PlayerNumber::One,
            identity: Some("0xabc".into()),
        });
        snapshot.players.push(Seat {
            player: PlayerNumber::Two,
            identity: None,
        });

        assert_eq!(snapshot.identity_of(PlayerNumber::One), Some("0xabc"));
        assert_eq!(snapshot.identity_of(PlayerNumber::Two), None);
    }
}
