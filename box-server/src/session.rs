//! Per-connection session management.
//!
//! Each connection gets a [`Session`] that tracks whether it holds a seat
//! and turns client messages into [`Reply`] actions. The session never
//! touches the socket; the WebSocket loop performs the replies.

use crate::error::{ProtocolError, RoomError};
use crate::server::{Coordinator, ServerMetrics};
use box_types::{ClientMessage, PlayerNumber, RoomId, ServerMessage, WireCodec};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Session state machine states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, no seat yet (or the seat was given up).
    AwaitingJoin,
    /// Seated in a room.
    InRoom {
        /// The room.
        room_id: RoomId,
        /// The seat.
        player: PlayerNumber,
    },
    /// Connection is gone.
    Closed,
}

/// What the connection loop should do next.
#[derive(Debug)]
pub enum Reply {
    /// Send a message to this connection only.
    Send(ServerMessage),
    /// Start forwarding these room broadcasts, replacing any previous ones.
    Subscribe(broadcast::Receiver<ServerMessage>),
    /// Stop forwarding room broadcasts.
    Unsubscribe,
}

/// A per-connection session.
pub struct Session {
    coordinator: Arc<Coordinator>,
    connection: u64,
    state: SessionState,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("connection", &self.connection)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a new session for a connection.
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        let connection = coordinator.open_connection();
        tracing::debug!(connection, "session opened");
        Self {
            coordinator,
            connection,
            state: SessionState::AwaitingJoin,
        }
    }

    /// Connection id.
    pub fn connection(&self) -> u64 {
        self.connection
    }

    /// Current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Decode one frame and handle it.
    pub async fn handle_frame(&mut self, codec: WireCodec, bytes: &[u8]) -> Vec<Reply> {
        if let Err(err) = self.check_rate() {
            return vec![Reply::Send(err.to_message())];
        }
        match codec.decode::<ClientMessage>(bytes) {
            Ok(message) => self.handle(message).await,
            Err(err) => {
                let err = ProtocolError::from(err);
                ServerMetrics::incr(&self.coordinator.metrics().errors_total);
                tracing::warn!(connection = self.connection, %err, "undecodable frame");
                vec![Reply::Send(err.to_message())]
            }
        }
    }

    /// Handle one decoded message.
    pub async fn handle(&mut self, message: ClientMessage) -> Vec<Reply> {
        let event = message.event_name();
        tracing::debug!(connection = self.connection, event, "message");

        match (self.state.clone(), message) {
            (SessionState::Closed, _) => vec![],

            (state, ClientMessage::JoinRoom(join)) => {
                let mut replies = Vec::new();
                // Rejoining the same room keeps the seat.
                if let SessionState::InRoom { room_id, .. } = &state {
                    if join.room_id.as_ref() != Some(room_id) {
                        self.coordinator.leave(self.connection, room_id).await;
                        self.state = SessionState::AwaitingJoin;
                        replies.push(Reply::Unsubscribe);
                    }
                }
                match self
                    .coordinator
                    .join(self.connection, join.room_id, join.identity)
                    .await
                {
                    Ok(joined) => {
                        let reply = joined.reply();
                        self.state = SessionState::InRoom {
                            room_id: joined.room_id,
                            player: joined.player,
                        };
                        replies.push(Reply::Subscribe(joined.events));
                        replies.push(Reply::Send(reply));
                    }
                    Err(err) => replies.push(self.rejected(err)),
                }
                replies
            }

            (SessionState::InRoom { room_id, .. }, ClientMessage::DrawLine(line)) => {
                match self
                    .coordinator
                    .submit_move(self.connection, &room_id, line)
                    .await
                {
                    // The room broadcast carries the confirmation.
                    Ok(_) => vec![],
                    Err(RoomError::Move(err)) => {
                        tracing::debug!(connection = self.connection, %err, "move refused");
                        vec![Reply::Send(ServerMessage::move_rejected(
                            err.code(),
                            err.to_string(),
                            line,
                        ))]
                    }
                    Err(err) => self.room_failure(err),
                }
            }

            (SessionState::InRoom { room_id, .. }, ClientMessage::NewGame) => {
                match self.coordinator.new_game(self.connection, &room_id).await {
                    Ok(()) => vec![],
                    Err(err) => self.room_failure(err),
                }
            }

            (SessionState::InRoom { room_id, .. }, ClientMessage::RequestState) => {
                match self.coordinator.snapshot(&room_id).await {
                    Ok(snapshot) => vec![Reply::Send(ServerMessage::GameState(snapshot))],
                    Err(err) => self.room_failure(err),
                }
            }

            (SessionState::InRoom { room_id, .. }, ClientMessage::IdentityChanged(change)) => {
                match self
                    .coordinator
                    .change_identity(self.connection, &room_id, change.identity)
                    .await
                {
                    Ok(()) => vec![],
                    Err(err) => self.room_failure(err),
                }
            }

            (SessionState::InRoom { room_id, .. }, ClientMessage::LeaveRoom) => {
                self.coordinator.leave(self.connection, &room_id).await;
                self.state = SessionState::AwaitingJoin;
                vec![Reply::Unsubscribe]
            }

            (SessionState::AwaitingJoin, ClientMessage::LeaveRoom) => vec![],

            (SessionState::AwaitingJoin, ClientMessage::DrawLine(_))
            | (SessionState::AwaitingJoin, ClientMessage::NewGame)
            | (SessionState::AwaitingJoin, ClientMessage::RequestState)
            | (SessionState::AwaitingJoin, ClientMessage::IdentityChanged(_)) => {
                vec![Reply::Send(ProtocolError::NotInRoom.to_message())]
            }
        }
    }

    /// Snapshot for a connection whose broadcast receiver fell behind.
    pub async fn resync(&mut self) -> Vec<Reply> {
        let SessionState::InRoom { room_id, .. } = self.state.clone() else {
            return vec![Reply::Unsubscribe];
        };
        match self.coordinator.snapshot(&room_id).await {
            Ok(snapshot) => vec![Reply::Send(ServerMessage::GameState(snapshot))],
            Err(err) => self.room_failure(err),
        }
    }

    /// Give up the seat, if any. Called when the socket goes away.
    pub async fn close(&mut self) {
        if let SessionState::InRoom { room_id, .. } = &self.state {
            self.coordinator.leave(self.connection, room_id).await;
        }
        self.state = SessionState::Closed;
        tracing::debug!(connection = self.connection, "session closed");
    }

    fn check_rate(&self) -> Result<(), ProtocolError> {
        self.coordinator
            .rate_limits()
            .check_message(self.connection)
            .map_err(|err| {
                ServerMetrics::incr(&self.coordinator.metrics().rate_limit_hits);
                tracing::warn!(connection = self.connection, %err, "rate limited");
                ProtocolError::from(err)
            })
    }

    fn rejected(&self, err: RoomError) -> Reply {
        tracing::warn!(connection = self.connection, %err, "request rejected");
        Reply::Send(err.to_message())
    }

    /// The room vanished or no longer seats us: drop back to awaiting join.
    fn room_failure(&mut self, err: RoomError) -> Vec<Reply> {
        let lost_seat = matches!(err, RoomError::RoomNotFound(_) | RoomError::NotSeated(_));
        let reply = self.rejected(err);
        if lost_seat {
            self.state = SessionState::AwaitingJoin;
            vec![Reply::Unsubscribe, reply]
        } else {
            vec![reply]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use box_types::{DrawLine, Dot, ErrorCode, JoinRoom, Phase};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn coordinator() -> Arc<Coordinator> {
        let mut config = Config::default();
        config.game.grid_size = 3;
        Arc::new(Coordinator::new(config))
    }

    fn join(room: &str) -> ClientMessage {
        ClientMessage::JoinRoom(JoinRoom {
            room_id: Some(RoomId::parse(room).unwrap()),
            identity: None,
        })
    }

    fn sent(replies: &[Reply]) -> Vec<&ServerMessage> {
        replies
            .iter()
            .filter_map(|r| match r {
                Reply::Send(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn error_code(replies: &[Reply]) -> Option<ErrorCode> {
        sent(replies).into_iter().find_map(|m| match m {
            ServerMessage::Error(payload) => Some(payload.code),
            _ => None,
        })
    }

    #[tokio::test]
    async fn join_subscribes_then_replies() {
        let mut session = Session::new(coordinator());
        let replies = session.handle(join("lobby")).await;

        assert!(matches!(replies[0], Reply::Subscribe(_)));
        let Reply::Send(ServerMessage::RoomJoined(joined)) = &replies[1] else {
            panic!("expected roomJoined");
        };
        assert_eq!(joined.player_number, PlayerNumber::One);
        assert_eq!(joined.game_state.state, Phase::Waiting);
        assert!(matches!(session.state(), SessionState::InRoom { .. }));
    }

    #[tokio::test]
    async fn room_messages_need_a_seat() {
        let mut session = Session::new(coordinator());
        let replies = session.handle(ClientMessage::RequestState).await;
        assert_eq!(error_code(&replies), Some(ErrorCode::NotInRoom));

        let replies = session
            .handle(ClientMessage::DrawLine(DrawLine {
                start: Dot::new(0, 0),
                end: Dot::new(0, 1),
                player: PlayerNumber::One,
            }))
            .await;
        assert_eq!(error_code(&replies), Some(ErrorCode::NotInRoom));
    }

    #[tokio::test]
    async fn rejected_move_goes_to_sender_only() {
        let coordinator = coordinator();
        let mut first = Session::new(coordinator.clone());
        let mut second = Session::new(coordinator);
        first.handle(join("duel")).await;
        second.handle(join("duel")).await;

        let line = DrawLine {
            start: Dot::new(0, 0),
            end: Dot::new(0, 1),
            player: PlayerNumber::Two,
        };
        let replies = second.handle(ClientMessage::DrawLine(line)).await;
        assert_eq!(error_code(&replies), Some(ErrorCode::NotYourTurn));
        let refused = sent(&replies).into_iter().find_map(|msg| match msg {
            ServerMessage::Error(payload) => payload.line,
            _ => None,
        });
        assert_eq!(refused, Some(line));
    }

    #[tokio::test]
    async fn accepted_move_has_no_direct_reply() {
        let coordinator = coordinator();
        let mut first = Session::new(coordinator.clone());
        let mut second = Session::new(coordinator);
        first.handle(join("duel")).await;
        second.handle(join("duel")).await;

        let replies = first
            .handle(ClientMessage::DrawLine(DrawLine {
                start: Dot::new(0, 0),
                end: Dot::new(0, 1),
                player: PlayerNumber::One,
            }))
            .await;
        assert!(replies.is_empty());
    }

    #[tokio::test]
    async fn request_state_replies_with_snapshot() {
        let mut session = Session::new(coordinator());
        session.handle(join("state")).await;
        let replies = session.handle(ClientMessage::RequestState).await;
        assert!(matches!(
            sent(&replies)[..],
            [ServerMessage::GameState(_)]
        ));
    }

    #[tokio::test]
    async fn leave_returns_to_awaiting_join() {
        let coordinator = coordinator();
        let mut session = Session::new(coordinator.clone());
        session.handle(join("exit")).await;

        let replies = session.handle(ClientMessage::LeaveRoom).await;
        assert!(matches!(replies[..], [Reply::Unsubscribe]));
        assert_eq!(session.state(), &SessionState::AwaitingJoin);
        assert_eq!(coordinator.total_rooms(), 0);
    }

    #[tokio::test]
    async fn joining_elsewhere_leaves_the_old_room() {
        let coordinator = coordinator();
        let mut session = Session::new(coordinator.clone());
        session.handle(join("first")).await;
        let replies = session.handle(join("second")).await;

        assert!(matches!(replies[0], Reply::Unsubscribe));
        assert!(matches!(replies[1], Reply::Subscribe(_)));
        assert_eq!(coordinator.total_rooms(), 1);
    }

    #[tokio::test]
    async fn rejoining_the_same_room_keeps_the_seat() {
        let coordinator = coordinator();
        let mut first = Session::new(coordinator.clone());
        let mut second = Session::new(coordinator.clone());
        first.handle(join("same")).await;
        second.handle(join("same")).await;

        let replies = second.handle(join("same")).await;
        let Some(ServerMessage::RoomJoined(joined)) = sent(&replies).into_iter().next() else {
            panic!("expected roomJoined");
        };
        assert_eq!(joined.player_number, PlayerNumber::Two);
        assert_eq!(joined.game_state.state, Phase::Playing);
        assert_eq!(coordinator.total_players(), 2);
    }

    #[tokio::test]
    async fn removed_room_drops_the_seat() {
        let coordinator = coordinator();
        let mut session = Session::new(coordinator.clone());
        session.handle(join("gone")).await;
        coordinator.remove_idle_rooms(Duration::ZERO);

        let replies = session.handle(ClientMessage::RequestState).await;
        assert!(matches!(replies[0], Reply::Unsubscribe));
        assert_eq!(error_code(&replies), Some(ErrorCode::RoomNotFound));
        assert_eq!(session.state(), &SessionState::AwaitingJoin);
    }

    #[tokio::test]
    async fn garbage_frame_is_reported() {
        let coordinator = coordinator();
        let mut session = Session::new(coordinator.clone());
        let replies = session
            .handle_frame(WireCodec::Json, b"{\"event\":\"dance\"}")
            .await;
        assert_eq!(error_code(&replies), Some(ErrorCode::InvalidMessage));
        assert_eq!(
            coordinator.metrics().errors_total.load(Ordering::Relaxed),
            1
        );
    }

    #[tokio::test]
    async fn messagepack_frames_are_accepted() {
        let mut session = Session::new(coordinator());
        let bytes = WireCodec::MessagePack.encode(&join("packed")).unwrap();
        let replies = session.handle_frame(WireCodec::MessagePack, &bytes).await;
        assert!(matches!(
            sent(&replies)[..],
            [ServerMessage::RoomJoined(_)]
        ));
    }

    #[tokio::test]
    async fn flooding_is_rate_limited() {
        let mut config = Config::default();
        config.limits.messages_per_minute = 2;
        let mut session = Session::new(Arc::new(Coordinator::new(config)));
        let frame = ClientMessage::RequestState.to_json().unwrap();

        session.handle_frame(WireCodec::Json, frame.as_bytes()).await;
        session.handle_frame(WireCodec::Json, frame.as_bytes()).await;
        let replies = session.handle_frame(WireCodec::Json, frame.as_bytes()).await;
        assert_eq!(error_code(&replies), Some(ErrorCode::RateLimited));
    }

    #[tokio::test]
    async fn close_frees_the_seat() {
        let coordinator = coordinator();
        let mut session = Session::new(coordinator.clone());
        session.handle(join("closing")).await;
        session.close().await;

        assert_eq!(session.state(), &SessionState::Closed);
        assert_eq!(coordinator.total_rooms(), 0);
        assert!(session.handle(ClientMessage::RequestState).await.is_empty());
    }
}
