//! Addressing, identity and ordering types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::WireError;

/// A dot on the lattice, addressed by `(row, col)`.
///
/// Dots carry no state; they only name the endpoints of an edge.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dot {
    /// Row index
    pub row: usize,
    /// Column index
    pub col: usize,
}

impl Dot {
    /// Create a new dot.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Dot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

impl fmt::Debug for Dot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dot({},{})", self.row, self.col)
    }
}

/// One of the two seats at a board.
///
/// Serialized as the integer `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PlayerNumber {
    /// First player to join a room
    One,
    /// Second player to join a room
    Two,
}

impl PlayerNumber {
    /// Both seats in turn order.
    pub const ALL: [PlayerNumber; 2] = [PlayerNumber::One, PlayerNumber::Two];

    /// The other seat.
    pub fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    /// Numeric form used on the wire and in labels.
    pub fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// Zero-based seat index.
    pub fn index(self) -> usize {
        usize::from(self.number() - 1)
    }
}

impl TryFrom<u8> for PlayerNumber {
    type Error = WireError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(WireError::InvalidData(format!(
                "player number must be 1 or 2, got {other}"
            ))),
        }
    }
}

impl From<PlayerNumber> for u8 {
    fn from(value: PlayerNumber) -> Self {
        value.number()
    }
}

impl fmt::Display for PlayerNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

/// Lifecycle phase of one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Fewer than two players seated
    #[default]
    Waiting,
    /// Two players seated, turns proceed
    Playing,
    /// Every box has an owner
    Finished,
}

/// Box counts per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Scores {
    /// Boxes owned by player 1
    pub player1: u32,
    /// Boxes owned by player 2
    pub player2: u32,
}

impl Scores {
    /// Score of one player.
    pub fn get(&self, player: PlayerNumber) -> u32 {
        match player {
            PlayerNumber::One => self.player1,
            PlayerNumber::Two => self.player2,
        }
    }

    /// Add one box to a player's score.
    pub fn increment(&mut self, player: PlayerNumber) {
        match player {
            PlayerNumber::One => self.player1 += 1,
            PlayerNumber::Two => self.player2 += 1,
        }
    }

    /// Boxes owned by either player.
    pub fn total(&self) -> u32 {
        self.player1 + self.player2
    }

    /// Who leads, or `Draw` when level.
    pub fn outcome(&self) -> Outcome {
        match self.player1.cmp(&self.player2) {
            std::cmp::Ordering::Greater => Outcome::Winner(PlayerNumber::One),
            std::cmp::Ordering::Less => Outcome::Winner(PlayerNumber::Two),
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }
}

/// Result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Strictly higher score
    Winner(PlayerNumber),
    /// Equal scores
    Draw,
}

impl Outcome {
    /// Human-readable label sent in `gameEnded`.
    pub fn label(&self) -> String {
        match self {
            Self::Winner(player) => player.to_string(),
            Self::Draw => "Draw".to_string(),
        }
    }
}

/// Characters used for generated room ids (no 0/O/1/I lookalikes).
const ROOM_ID_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of generated room ids.
const GENERATED_ROOM_ID_LEN: usize = 6;

/// Maximum length of a client-chosen room id.
pub const MAX_ROOM_ID_LEN: usize = 32;

/// Identifier of a room (one board, up to two players).
///
/// Client-chosen ids may use ASCII letters, digits, `-` and `_`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Validate a room id.
    pub fn parse(value: &str) -> Result<Self, WireError> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_ROOM_ID_LEN {
            return Err(WireError::InvalidRoomId(format!(
                "length must be 1..={MAX_ROOM_ID_LEN}, got {}",
                trimmed.len()
            )));
        }
        if let Some(ch) = trimmed
            .chars()
            .find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_'))
        {
            return Err(WireError::InvalidRoomId(format!("invalid character '{ch}'")));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Create a new random room id.
    pub fn random() -> Self {
        let mut bytes = [0u8; GENERATED_ROOM_ID_LEN];
        getrandom::getrandom(&mut bytes).expect("getrandom failed");
        let id = bytes
            .iter()
            .map(|b| char::from(ROOM_ID_ALPHABET[usize::from(*b) % ROOM_ID_ALPHABET.len()]))
            .collect();
        Self(id)
    }

    /// Borrow the id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = WireError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomId> for String {
    fn from(value: RoomId) -> Self {
        value.0
    }
}

impl std::str::FromStr for RoomId {
    type Err = WireError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoomId({})", self.0)
    }
}

/// A monotonically increasing move sequence number.
///
/// Assigned by the coordinator, one per accepted move within a game.
/// `Seq(0)` means no move has been applied yet.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Seq(u64);

impl Seq {
    /// Create a new Seq with the given value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the numeric value.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The sequence number before any move.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Increment by one.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Seq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Seq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seq({})", self.0)
    }
}
