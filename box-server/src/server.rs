//! Main Coordinator.
//!
//! The coordinator owns the room registry, the rate limiters and the
//! metrics. Rooms are independent: each sits behind its own mutex, so
//! moves in different rooms proceed concurrently while moves in one room
//! are applied in arrival order.

use crate::config::Config;
use crate::error::{RoomError, RoomResult};
use crate::limits::RateLimits;
use crate::room::Room;
use box_core::MoveResult;
use box_types::{DrawLine, GameSnapshot, PlayerNumber, RoomId, ServerMessage};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex};

/// Attempts to find a live room before giving up on a join.
const JOIN_ATTEMPTS: usize = 3;

/// Operational metrics for monitoring coordinator activity.
///
/// All counters are monotonically increasing (reset only on restart).
#[derive(Debug, Default)]
pub struct ServerMetrics {
    /// Total WebSocket connections accepted.
    pub connections_total: AtomicU64,
    /// Total successful joins.
    pub joins_total: AtomicU64,
    /// Total rooms created.
    pub rooms_created: AtomicU64,
    /// Total moves applied.
    pub moves_applied: AtomicU64,
    /// Total moves rejected by the rules engine.
    pub moves_rejected: AtomicU64,
    /// Total games played to the end.
    pub games_finished: AtomicU64,
    /// Total rate limit rejections.
    pub rate_limit_hits: AtomicU64,
    /// Total protocol errors (undecodable frames, unexpected messages).
    pub errors_total: AtomicU64,
}

impl ServerMetrics {
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// A successful join.
#[derive(Debug)]
pub struct Joined {
    /// Room joined (generated when the request had none).
    pub room_id: RoomId,
    /// Seat assigned.
    pub player: PlayerNumber,
    /// Snapshot taken right after seating.
    pub snapshot: GameSnapshot,
    /// Room broadcasts from this point on.
    pub events: broadcast::Receiver<ServerMessage>,
}

impl Joined {
    /// The `roomJoined` reply.
    pub fn reply(&self) -> ServerMessage {
        ServerMessage::RoomJoined(box_types::RoomJoined {
            room_id: self.room_id.clone(),
            player_number: self.player,
            game_state: self.snapshot.clone(),
        })
    }
}

/// The session coordinator.
pub struct Coordinator {
    config: Config,
    /// Rate limiters for messages.
    rate_limits: RateLimits,
    /// Operational metrics (counters).
    metrics: ServerMetrics,
    /// Live rooms.
    rooms: DashMap<RoomId, Arc<Mutex<Room>>>,
    next_connection: AtomicU64,
    next_guest: AtomicU64,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("config", &self.config)
            .field("rate_limits", &self.rate_limits)
            .field("metrics", &self.metrics)
            .field("rooms_count", &self.rooms.len())
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    /// Create a coordinator with the given config.
    pub fn new(config: Config) -> Self {
        let rate_limits = RateLimits::new(&config.limits);
        Self {
            config,
            rate_limits,
            metrics: ServerMetrics::default(),
            rooms: DashMap::new(),
            next_connection: AtomicU64::new(1),
            next_guest: AtomicU64::new(1),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get access to the rate limiters.
    pub fn rate_limits(&self) -> &RateLimits {
        &self.rate_limits
    }

    /// Get access to the operational metrics.
    pub fn metrics(&self) -> &ServerMetrics {
        &self.metrics
    }

    /// Allocate an id for a new connection.
    pub fn open_connection(&self) -> u64 {
        ServerMetrics::incr(&self.metrics.connections_total);
        self.next_connection.fetch_add(1, Ordering::Relaxed)
    }

    /// Seat `connection` in `room_id`, creating the room if needed.
    ///
    /// Without a room id a fresh room with a random id is created.
    pub async fn join(
        &self,
        connection: u64,
        room_id: Option<RoomId>,
        identity: Option<String>,
    ) -> RoomResult<Joined> {
        let room_id = room_id.unwrap_or_else(RoomId::random);
        let identity = self.normalize_identity(identity);

        for _ in 0..JOIN_ATTEMPTS {
            let room = self.get_or_create(&room_id)?;
            let mut room = room.lock().await;
            // Removed between lookup and lock; look it up again.
            if room.is_closed() {
                continue;
            }

            let seated = room.join(connection, identity.clone())?;
            ServerMetrics::incr(&self.metrics.joins_total);
            tracing::info!(
                room = %room_id,
                player = %seated.player,
                connection,
                "player joined"
            );
            return Ok(Joined {
                room_id: room_id.clone(),
                player: seated.player,
                snapshot: room.snapshot(),
                events: seated.events,
            });
        }
        Err(RoomError::RoomNotFound(room_id))
    }

    /// Apply a move in `room_id` for `connection`.
    pub async fn submit_move(
        &self,
        connection: u64,
        room_id: &RoomId,
        line: DrawLine,
    ) -> RoomResult<MoveResult> {
        let room = self.room(room_id)?;
        let mut room = room.lock().await;
        match room.submit(connection, line) {
            Ok(result) => {
                ServerMetrics::incr(&self.metrics.moves_applied);
                if result.outcome.is_some() {
                    ServerMetrics::incr(&self.metrics.games_finished);
                }
                Ok(result)
            }
            Err(err) => {
                if matches!(err, RoomError::Move(_)) {
                    ServerMetrics::incr(&self.metrics.moves_rejected);
                }
                tracing::warn!(room = %room_id, connection, %err, "move rejected");
                Err(err)
            }
        }
    }

    /// Reset the board in `room_id`.
    pub async fn new_game(&self, connection: u64, room_id: &RoomId) -> RoomResult<()> {
        let room = self.room(room_id)?;
        let mut room = room.lock().await;
        room.reset(connection)
    }

    /// Current snapshot of `room_id`.
    pub async fn snapshot(&self, room_id: &RoomId) -> RoomResult<GameSnapshot> {
        let room = self.room(room_id)?;
        let room = room.lock().await;
        Ok(room.snapshot())
    }

    /// Update the identity shown for `connection`'s seat.
    pub async fn change_identity(
        &self,
        connection: u64,
        room_id: &RoomId,
        identity: Option<String>,
    ) -> RoomResult<()> {
        let identity = identity.map(|id| self.truncate_identity(&id));
        let room = self.room(room_id)?;
        let mut room = room.lock().await;
        room.set_identity(connection, identity)
    }

    /// Free `connection`'s seat; an emptied room is removed.
    pub async fn leave(&self, connection: u64, room_id: &RoomId) -> Option<PlayerNumber> {
        let room = self.room(room_id).ok()?;
        let mut room = room.lock().await;
        let seat = room.leave(connection)?;
        if room.is_empty() {
            room.close();
            self.rooms.remove(room_id);
            tracing::info!(room = %room_id, "room closed");
        }
        Some(seat)
    }

    /// Remove rooms with no activity for `max_idle`.
    ///
    /// Rooms whose lock is held are busy and skipped.
    pub fn remove_idle_rooms(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.rooms.retain(|room_id, room| match room.try_lock() {
            Ok(mut guard) if guard.idle_for(now) >= max_idle => {
                guard.close();
                tracing::info!(room = %room_id, "idle room removed");
                removed += 1;
                false
            }
            _ => true,
        });
        removed
    }

    /// Get total live rooms.
    pub fn total_rooms(&self) -> usize {
        self.rooms.len()
    }

    /// Get total seated players across all rooms.
    pub fn total_players(&self) -> usize {
        self.rooms
            .iter()
            .map(|entry| {
                // Can't await here; a busy room is skipped.
                entry
                    .value()
                    .try_lock()
                    .map(|room| room.player_count())
                    .unwrap_or(0)
            })
            .sum()
    }

    fn room(&self, room_id: &RoomId) -> RoomResult<Arc<Mutex<Room>>> {
        self.rooms
            .get(room_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))
    }

    fn get_or_create(&self, room_id: &RoomId) -> RoomResult<Arc<Mutex<Room>>> {
        if let Some(room) = self.rooms.get(room_id) {
            return Ok(room.value().clone());
        }
        let limit = self.config.game.max_rooms;
        if self.rooms.len() >= limit {
            tracing::warn!(limit, "room limit reached");
            return Err(RoomError::TooManyRooms { limit });
        }

        let grid_size = self.config.game.grid_size;
        let entry = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            ServerMetrics::incr(&self.metrics.rooms_created);
            tracing::info!(room = %room_id, grid_size, "room created");
            Arc::new(Mutex::new(Room::new(room_id.clone(), grid_size)))
        });
        Ok(entry.value().clone())
    }

    fn normalize_identity(&self, identity: Option<String>) -> Option<String> {
        let identity = identity
            .map(|id| self.truncate_identity(&id))
            .filter(|id| !id.is_empty());
        Some(identity.unwrap_or_else(|| {
            format!("guest-{}", self.next_guest.fetch_add(1, Ordering::Relaxed))
        }))
    }

    fn truncate_identity(&self, identity: &str) -> String {
        identity
            .trim()
            .chars()
            .take(self.config.limits.max_identity_len)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use box_core::MoveError;
    use box_types::{Dot, Phase};

    fn test_config() -> Config {
        let mut config = Config::default();
        config.game.grid_size = 3;
        config
    }

    fn room_id(id: &str) -> RoomId {
        RoomId::parse(id).unwrap()
    }

    fn line(a: (usize, usize), b: (usize, usize), player: PlayerNumber) -> DrawLine {
        DrawLine {
            start: Dot::new(a.0, a.1),
            end: Dot::new(b.0, b.1),
            player,
        }
    }

    #[tokio::test]
    async fn join_creates_room_and_assigns_seats() {
        let coordinator = Coordinator::new(test_config());

        let first = coordinator.join(1, Some(room_id("alpha")), None).await.unwrap();
        assert_eq!(first.player, PlayerNumber::One);
        assert_eq!(first.snapshot.state, Phase::Waiting);
        assert_eq!(first.snapshot.grid_size, 3);

        let second = coordinator.join(2, Some(room_id("alpha")), None).await.unwrap();
        assert_eq!(second.player, PlayerNumber::Two);
        assert_eq!(second.snapshot.state, Phase::Playing);

        assert_eq!(coordinator.total_rooms(), 1);
        assert_eq!(coordinator.total_players(), 2);
    }

    #[tokio::test]
    async fn join_without_room_id_generates_one() {
        let coordinator = Coordinator::new(test_config());
        let a = coordinator.join(1, None, None).await.unwrap();
        let b = coordinator.join(2, None, None).await.unwrap();
        assert_ne!(a.room_id, b.room_id);
        assert_eq!(coordinator.total_rooms(), 2);
    }

    #[tokio::test]
    async fn third_player_is_turned_away() {
        let coordinator = Coordinator::new(test_config());
        let id = room_id("full");
        coordinator.join(1, Some(id.clone()), None).await.unwrap();
        coordinator.join(2, Some(id.clone()), None).await.unwrap();
        let err = coordinator.join(3, Some(id), None).await.unwrap_err();
        assert!(matches!(err, RoomError::RoomFull(_)));
    }

    #[tokio::test]
    async fn room_limit_is_enforced() {
        let mut config = test_config();
        config.game.max_rooms = 1;
        let coordinator = Coordinator::new(config);

        coordinator.join(1, Some(room_id("one")), None).await.unwrap();
        let err = coordinator
            .join(2, Some(room_id("two")), None)
            .await
            .unwrap_err();
        assert_eq!(err, RoomError::TooManyRooms { limit: 1 });

        // Joining an existing room is still allowed.
        coordinator.join(2, Some(room_id("one")), None).await.unwrap();
    }

    #[tokio::test]
    async fn guests_get_session_identities() {
        let coordinator = Coordinator::new(test_config());
        let joined = coordinator.join(1, None, None).await.unwrap();
        assert_eq!(
            joined.snapshot.identity_of(PlayerNumber::One),
            Some("guest-1")
        );
    }

    #[tokio::test]
    async fn long_identities_are_truncated() {
        let mut config = test_config();
        config.limits.max_identity_len = 6;
        let coordinator = Coordinator::new(config);
        let joined = coordinator
            .join(1, None, Some("0x1234567890".into()))
            .await
            .unwrap();
        assert_eq!(joined.snapshot.identity_of(PlayerNumber::One), Some("0x1234"));
    }

    #[tokio::test]
    async fn moves_are_counted() {
        let coordinator = Coordinator::new(test_config());
        let id = room_id("moves");
        coordinator.join(1, Some(id.clone()), None).await.unwrap();
        coordinator.join(2, Some(id.clone()), None).await.unwrap();

        coordinator
            .submit_move(1, &id, line((0, 0), (0, 1), PlayerNumber::One))
            .await
            .unwrap();
        let err = coordinator
            .submit_move(1, &id, line((0, 1), (0, 2), PlayerNumber::One))
            .await
            .unwrap_err();
        assert_eq!(err, RoomError::Move(MoveError::NotYourTurn));

        let metrics = coordinator.metrics();
        assert_eq!(metrics.moves_applied.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.moves_rejected.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn unknown_room_is_reported() {
        let coordinator = Coordinator::new(test_config());
        let err = coordinator.snapshot(&room_id("ghost")).await.unwrap_err();
        assert!(matches!(err, RoomError::RoomNotFound(_)));
    }

    #[tokio::test]
    async fn last_leave_removes_room() {
        let coordinator = Coordinator::new(test_config());
        let id = room_id("bye");
        coordinator.join(1, Some(id.clone()), None).await.unwrap();
        coordinator.join(2, Some(id.clone()), None).await.unwrap();

        assert_eq!(coordinator.leave(1, &id).await, Some(PlayerNumber::One));
        assert_eq!(coordinator.total_rooms(), 1);
        assert_eq!(
            coordinator.snapshot(&id).await.unwrap().state,
            Phase::Waiting
        );

        assert_eq!(coordinator.leave(2, &id).await, Some(PlayerNumber::Two));
        assert_eq!(coordinator.total_rooms(), 0);
        assert_eq!(coordinator.leave(2, &id).await, None);
    }

    #[tokio::test]
    async fn idle_rooms_are_removed() {
        let coordinator = Coordinator::new(test_config());
        coordinator.join(1, Some(room_id("idle")), None).await.unwrap();

        assert_eq!(coordinator.remove_idle_rooms(Duration::from_secs(3600)), 0);
        assert_eq!(coordinator.remove_idle_rooms(Duration::ZERO), 1);
        assert_eq!(coordinator.total_rooms(), 0);
    }

    #[tokio::test]
    async fn joining_a_removed_room_recreates_it() {
        let coordinator = Coordinator::new(test_config());
        let id = room_id("again");
        coordinator.join(1, Some(id.clone()), None).await.unwrap();
        coordinator.remove_idle_rooms(Duration::ZERO);

        let joined = coordinator.join(2, Some(id), None).await.unwrap();
        assert_eq!(joined.player, PlayerNumber::One);
        assert_eq!(
            coordinator.metrics().rooms_created.load(Ordering::Relaxed),
            2
        );
    }
}
