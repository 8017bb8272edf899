//! One room: a game, two seats and a broadcast channel.
//!
//! A [`Room`] is always used behind the coordinator's per-room mutex, so
//! moves within one room are applied strictly one at a time in arrival
//! order. Every method is synchronous; broadcasting never waits on a
//! slow connection.

use box_core::{Game, MoveResult};
use box_types::{DrawLine, GameSnapshot, PlayerNumber, RoomId, Seat, ServerMessage};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

use crate::error::{RoomError, RoomResult};

/// Broadcast buffer per room. A receiver that falls further behind gets
/// a full snapshot instead.
const ROOM_CHANNEL_CAPACITY: usize = 64;

/// A seated connection.
#[derive(Debug, Clone)]
struct Occupant {
    connection: u64,
    identity: Option<String>,
}

/// Result of taking a seat.
#[derive(Debug)]
pub struct Seated {
    /// The seat taken.
    pub player: PlayerNumber,
    /// Room broadcasts from this point on.
    pub events: broadcast::Receiver<ServerMessage>,
    /// Whether this join started the game.
    pub started: bool,
}

/// An isolated game session.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    grid_size: usize,
    game: Game,
    seats: [Option<Occupant>; 2],
    events: broadcast::Sender<ServerMessage>,
    last_activity: Instant,
    closed: bool,
}

impl Room {
    /// Create an empty room in `waiting`.
    pub fn new(id: RoomId, grid_size: usize) -> Self {
        let (events, _) = broadcast::channel(ROOM_CHANNEL_CAPACITY);
        Self {
            id,
            grid_size,
            game: Game::new(grid_size),
            seats: [None, None],
            events,
            last_activity: Instant::now(),
            closed: false,
        }
    }

    /// Room id.
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// The current game.
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Seat held by `connection`, if any.
    pub fn seat_of(&self, connection: u64) -> Option<PlayerNumber> {
        PlayerNumber::ALL.into_iter().find(|player| {
            self.seats[player.index()]
                .as_ref()
                .is_some_and(|o| o.connection == connection)
        })
    }

    /// Number of occupied seats.
    pub fn player_count(&self) -> usize {
        self.seats.iter().filter(|s| s.is_some()).count()
    }

    /// Whether nobody is seated.
    pub fn is_empty(&self) -> bool {
        self.player_count() == 0
    }

    /// Whether the room was removed from the registry.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Mark the room as removed; late joiners must pick it up again.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Time since the last join, move, reset or leave.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    /// Seat list as carried in snapshots.
    pub fn players(&self) -> Vec<Seat> {
        PlayerNumber::ALL
            .into_iter()
            .filter_map(|player| {
                self.seats[player.index()].as_ref().map(|o| Seat {
                    player,
                    identity: o.identity.clone(),
                })
            })
            .collect()
    }

    /// Full snapshot of the room.
    pub fn snapshot(&self) -> GameSnapshot {
        self.game.snapshot(self.players())
    }

    /// Seat `connection`, player 1 first.
    ///
    /// A connection that already holds a seat keeps it. When the second
    /// seat fills, the game starts and everyone receives a `gameState`.
    pub fn join(&mut self, connection: u64, identity: Option<String>) -> RoomResult<Seated> {
        let player = match self.seat_of(connection) {
            Some(player) => player,
            None => {
                let player = PlayerNumber::ALL
                    .into_iter()
                    .find(|p| self.seats[p.index()].is_none())
                    .ok_or_else(|| RoomError::RoomFull(self.id.clone()))?;
                self.seats[player.index()] = Some(Occupant {
                    connection,
                    identity,
                });
                player
            }
        };

        let events = self.events.subscribe();
        self.touch();

        let started = self.player_count() == 2 && self.game.start();
        if started {
            tracing::info!(room = %self.id, "game started");
            self.broadcast(ServerMessage::GameState(self.snapshot()));
        }

        Ok(Seated {
            player,
            events,
            started,
        })
    }

    /// Apply a move for `connection` and broadcast the result.
    ///
    /// The seat is authoritative: a `player` field that does not match the
    /// sender's seat is rejected as out of turn.
    pub fn submit(&mut self, connection: u64, line: DrawLine) -> RoomResult<MoveResult> {
        let seat = self
            .seat_of(connection)
            .ok_or_else(|| RoomError::NotSeated(self.id.clone()))?;
        if line.player != seat {
            return Err(box_core::MoveError::NotYourTurn.into());
        }

        let result = self.game.apply_move(line.start, line.end, seat)?;
        self.touch();
        tracing::debug!(
            room = %self.id,
            seq = %result.seq,
            player = %seat,
            boxes = result.completed.len(),
            "move applied"
        );
        for message in result.messages() {
            self.broadcast(message);
        }
        if let Some(outcome) = result.outcome {
            tracing::info!(room = %self.id, winner = %outcome.label(), "game finished");
        }
        Ok(result)
    }

    /// Start a fresh board, keeping the seats.
    pub fn reset(&mut self, connection: u64) -> RoomResult<()> {
        if self.seat_of(connection).is_none() {
            return Err(RoomError::NotSeated(self.id.clone()));
        }
        self.restart();
        tracing::info!(room = %self.id, "new game");
        Ok(())
    }

    /// Replace the identity shown for `connection`'s seat.
    pub fn set_identity(&mut self, connection: u64, identity: Option<String>) -> RoomResult<()> {
        let seat = self
            .seat_of(connection)
            .ok_or_else(|| RoomError::NotSeated(self.id.clone()))?;
        if let Some(occupant) = self.seats[seat.index()].as_mut() {
            occupant.identity = identity;
        }
        self.touch();
        self.broadcast(ServerMessage::GameState(self.snapshot()));
        Ok(())
    }

    /// Free `connection`'s seat.
    ///
    /// If one player remains, the room goes back to a fresh game in
    /// `waiting` and the remaining player is told.
    pub fn leave(&mut self, connection: u64) -> Option<PlayerNumber> {
        let seat = self.seat_of(connection)?;
        self.seats[seat.index()] = None;
        self.touch();
        tracing::info!(room = %self.id, player = %seat, "player left");

        if !self.is_empty() {
            self.restart();
        }
        Some(seat)
    }

    fn restart(&mut self) {
        self.game = Game::new(self.grid_size);
        if self.player_count() == 2 {
            self.game.start();
        }
        self.touch();
        self.broadcast(ServerMessage::GameState(self.snapshot()));
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    fn broadcast(&self, message: ServerMessage) {
        // No receivers is fine: everyone may have gone.
        let _ = self.events.send(message);
    }
}
