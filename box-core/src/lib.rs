//! # box-core
//!
//! Pure game logic for dots-and-boxes (no I/O, instant tests).
//!
//! This crate implements the board model, move validation, the rules
//! engine and the client mirror without any network or disk I/O, so the
//! same code runs on the coordinator and inside every client.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Identical rule decisions on both ends of the wire
//!
//! The actual I/O is performed by `box-client` and `box-server`, which
//! interpret the actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod board;
pub mod error;
pub mod identity;
pub mod mirror;
pub mod rules;
pub mod selection;
pub mod sound;
pub mod turn;
pub mod validator;

pub use board::{are_adjacent, Board, BoxCoord, Edge, Orientation, MAX_GRID_SIZE, MIN_GRID_SIZE};
pub use error::{IdentityError, MoveError, SnapshotError};
pub use identity::{short_address, IdentityAction, IdentityEvent, IdentityState};
pub use mirror::{GameEvent, Mirror, MirrorAction};
pub use rules::{Game, MoveResult};
pub use selection::{DotPicker, Pick};
pub use sound::{SoundCue, Tone, Waveform, DEFAULT_VOLUME};
pub use turn::TurnState;
pub use validator::validate;
