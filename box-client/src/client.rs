//! GameClient - the main interface for playing over the network.
//!
//! # Architecture
//!
//! GameClient uses the pure [`Mirror`] from box-core for game logic and
//! interprets its actions to perform actual I/O via the Transport trait.
//!
//! ```text
//! Presenter ← GameClient → Transport → Coordinator
//!                 ↓
//!            box-core Mirror (speculation + reconciliation)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use box_client::{ClientConfig, GameClient, WebSocketTransport};
//!
//! let config = ClientConfig::new("ws://localhost:3001/ws");
//! let client = GameClient::new(config, WebSocketTransport::new());
//!
//! client.connect().await?;
//! client.join(None).await?;
//! client.draw_line(Dot::new(0, 0), Dot::new(0, 1)).await?;
//! ```

use std::sync::Arc;

use box_core::{
    DotPicker, GameEvent, IdentityAction, IdentityError, IdentityEvent, IdentityState, Mirror,
    MirrorAction, MoveError, Pick,
};
use box_types::{
    ClientMessage, Dot, ErrorCode, GameSnapshot, IdentityChanged, JoinRoom, PlayerNumber, RoomId,
    ServerMessage, WireCodec, WireError, DEFAULT_GRID_SIZE,
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::presenter::{dispatch, Presenter, SoundSink};
use crate::transport::{Frame, Transport, TransportError};

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Encoding or decoding failed.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// Local validation refused the move.
    #[error("move rejected locally: {0}")]
    Move(#[from] MoveError),

    /// Identity required but not available.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The request needs a seat in a room.
    #[error("not in a room")]
    NotJoined,

    /// The coordinator refused a request.
    #[error("rejected by server ({code:?}): {message}")]
    Rejected {
        /// Reason code
        code: ErrorCode,
        /// Server message
        message: String,
    },

    /// Unexpected message flow.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Configuration for GameClient.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Coordinator address (`ws://host:port/ws`).
    pub server_url: String,
    /// Frame encoding for outgoing messages.
    pub codec: WireCodec,
    /// Identity to announce on join.
    pub identity: Option<String>,
    /// Board size assumed until the first snapshot arrives.
    pub grid_size: usize,
}

impl ClientConfig {
    /// Create a configuration for the given coordinator address.
    pub fn new(server_url: &str) -> Self {
        Self {
            server_url: server_url.to_string(),
            codec: WireCodec::Json,
            identity: None,
            grid_size: DEFAULT_GRID_SIZE,
        }
    }

    /// Set the frame encoding.
    pub fn with_codec(mut self, codec: WireCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Set the identity announced on join.
    pub fn with_identity(mut self, identity: &str) -> Self {
        self.identity = Some(identity.to_string());
        self
    }

    /// Set the assumed board size.
    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }
}

/// The main game client.
///
/// Owns the mirror, the dot picker and the identity state for one seat.
pub struct GameClient<T: Transport> {
    config: ClientConfig,
    transport: T,
    mirror: Arc<Mutex<Mirror>>,
    picker: Arc<Mutex<DotPicker>>,
    identity: Arc<Mutex<IdentityState>>,
}

impl<T: Transport> GameClient<T> {
    /// Create a new GameClient.
    pub fn new(config: ClientConfig, transport: T) -> Self {
        let identity = match &config.identity {
            Some(id) => IdentityState::Connected { id: id.clone() },
            None => IdentityState::Disconnected,
        };
        Self {
            mirror: Arc::new(Mutex::new(Mirror::new(config.grid_size))),
            picker: Arc::new(Mutex::new(DotPicker::new(config.grid_size))),
            identity: Arc::new(Mutex::new(identity)),
            config,
            transport,
        }
    }

    /// Open the transport.
    pub async fn connect(&self) -> Result<(), ClientError> {
        self.transport.connect(&self.config.server_url).await?;
        info!(server = %self.config.server_url, "connected");
        Ok(())
    }

    /// Check if the transport is open.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Close the transport.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        self.transport.close().await?;
        Ok(())
    }

    /// Join (or create, when `room_id` is `None`) a room.
    ///
    /// Waits for `roomJoined`; other messages arriving first are applied.
    pub async fn join(&self, room_id: Option<RoomId>) -> Result<Vec<GameEvent>, ClientError> {
        let identity = self.identity.lock().await.current_id().map(str::to_string);
        self.send(ClientMessage::JoinRoom(JoinRoom { room_id, identity }))
            .await?;

        let mut events = Vec::new();
        loop {
            let message = self.recv_message().await?;
            if let ServerMessage::Error(payload) = &message {
                if self.seat().await.is_none() {
                    return Err(ClientError::Rejected {
                        code: payload.code,
                        message: payload.message.clone(),
                    });
                }
            }
            let joined = matches!(message, ServerMessage::RoomJoined(_));
            events.extend(self.apply(message).await?);
            if joined {
                return Ok(events);
            }
        }
    }

    /// Our seat, once joined.
    pub async fn seat(&self) -> Option<PlayerNumber> {
        self.mirror.lock().await.seat()
    }

    /// Our room, once joined.
    pub async fn room(&self) -> Option<RoomId> {
        self.mirror.lock().await.room().cloned()
    }

    /// Whether the local player may move now.
    pub async fn can_move(&self) -> bool {
        self.mirror.lock().await.can_move()
    }

    /// Snapshot of what the player currently sees.
    pub async fn snapshot(&self) -> GameSnapshot {
        self.mirror.lock().await.snapshot()
    }

    /// Number of local moves not yet confirmed.
    pub async fn pending_moves(&self) -> usize {
        self.mirror.lock().await.pending_len()
    }

    /// Make a move: apply it locally, then send it.
    ///
    /// Returns the speculative events to present.
    ///
    /// A move that cannot be sent is withdrawn from the view again.
    pub async fn draw_line(&self, start: Dot, end: Dot) -> Result<Vec<GameEvent>, ClientError> {
        let actions = {
            let mut mirror = self.mirror.lock().await;
            if mirror.seat().is_none() {
                return Err(ClientError::NotJoined);
            }
            if !self.transport.is_connected() {
                return Err(TransportError::NotConnected.into());
            }
            mirror.propose(start, end)?
        };
        debug!(%start, %end, "proposed move");
        match self.execute(actions).await {
            Ok(events) => Ok(events),
            Err(err) => {
                self.mirror.lock().await.abandon_last();
                warn!(%start, %end, %err, "move not sent, withdrawn");
                Err(err)
            }
        }
    }

    /// Feed a dot click through the picker; a completed pair becomes a move.
    ///
    /// Moves that fail local validation are dropped silently.
    pub async fn click_dot(&self, dot: Dot) -> Result<(Pick, Vec<GameEvent>), ClientError> {
        let (enabled, grid_size) = {
            let mirror = self.mirror.lock().await;
            let enabled = mirror.can_move() && self.transport.is_connected();
            (enabled, mirror.view().board().grid_size())
        };
        let pick = {
            let mut picker = self.picker.lock().await;
            picker.resize(grid_size);
            picker.click(dot, enabled)
        };
        let events = match pick {
            Pick::Pair(a, b) => match self.draw_line(a, b).await {
                Ok(events) => events,
                Err(ClientError::Move(err)) => {
                    debug!(%err, "move suppressed locally");
                    Vec::new()
                }
                Err(err) => return Err(err),
            },
            _ => Vec::new(),
        };
        Ok((pick, events))
    }

    /// Drop any half-made dot selection.
    pub async fn cancel_selection(&self) -> Option<Dot> {
        self.picker.lock().await.cancel()
    }

    /// Ask the coordinator to reset the board.
    pub async fn new_game(&self) -> Result<(), ClientError> {
        self.require_seat().await?;
        self.send(ClientMessage::NewGame).await
    }

    /// Ask the coordinator for a full `gameState`.
    pub async fn request_state(&self) -> Result<(), ClientError> {
        self.send(ClientMessage::RequestState).await
    }

    /// Give up the seat.
    pub async fn leave(&self) -> Result<(), ClientError> {
        self.require_seat().await?;
        self.send(ClientMessage::LeaveRoom).await?;
        let grid_size = self.config.grid_size;
        *self.mirror.lock().await = Mirror::new(grid_size);
        *self.picker.lock().await = DotPicker::new(grid_size);
        Ok(())
    }

    /// Current identity, or `IdentityUnavailable`.
    pub async fn require_identity(&self) -> Result<String, ClientError> {
        let identity = self.identity.lock().await;
        Ok(identity.require()?.to_string())
    }

    /// Apply an identity notification; announce it when seated.
    pub async fn identity_event(&self, event: IdentityEvent) -> Result<(), ClientError> {
        let actions = {
            let mut identity = self.identity.lock().await;
            let (next, actions) = identity.clone().on_event(event);
            *identity = next;
            actions
        };
        if self.seat().await.is_none() {
            return Ok(());
        }
        for action in actions {
            let IdentityAction::Announce(identity) = action;
            self.send(ClientMessage::IdentityChanged(IdentityChanged { identity }))
                .await?;
        }
        Ok(())
    }

    /// Receive one frame and apply it.
    ///
    /// Returns the events to present. Not cancel safe: racing it in
    /// `select!` can lose the sends a message calls for. Loops that wait on
    /// other sources too should race [`recv_message`](Self::recv_message)
    /// and [`apply`](Self::apply) the result outside the race.
    pub async fn next_events(&self) -> Result<Vec<GameEvent>, ClientError> {
        let message = self.recv_message().await?;
        self.apply(message).await
    }

    /// Receive and decode one frame without applying it.
    ///
    /// Cancel safe: a dropped call consumes no frame.
    pub async fn recv_message(&self) -> Result<ServerMessage, ClientError> {
        let frame = self.transport.recv().await?;
        Ok(frame.decode()?)
    }

    /// Apply one server message, send what it calls for, and return the
    /// events to present.
    pub async fn apply(&self, message: ServerMessage) -> Result<Vec<GameEvent>, ClientError> {
        debug!(event = message.event_name(), "received");
        let actions = self.mirror.lock().await.on_server(message);
        self.execute(actions).await
    }

    /// Drive the client until the connection closes.
    ///
    /// Every server event goes to the presenter and sound sink. Identity
    /// notifications from `identity` are announced to the coordinator.
    pub async fn run(
        &self,
        presenter: &dyn Presenter,
        sound: &dyn SoundSink,
        mut identity: Option<broadcast::Receiver<IdentityEvent>>,
    ) -> Result<(), ClientError> {
        loop {
            let received = tokio::select! {
                biased;
                Some(event) = next_identity(&mut identity) => {
                    self.identity_event(event).await?;
                    continue;
                }
                received = self.recv_message() => received,
            };
            let applied = match received {
                Ok(message) => self.apply(message).await,
                Err(err) => Err(err),
            };
            match applied {
                Ok(events) => {
                    for event in &events {
                        dispatch(event, presenter, sound);
                    }
                }
                Err(ClientError::Transport(TransportError::ConnectionClosed)) => {
                    info!("connection closed");
                    return Ok(());
                }
                Err(ClientError::Wire(err)) => {
                    warn!(%err, "dropping undecodable frame");
                }
                Err(err) => {
                    presenter.show_error(&err.to_string());
                    return Err(err);
                }
            }
        }
    }

    /// Get a reference to the underlying transport (for testing).
    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn require_seat(&self) -> Result<PlayerNumber, ClientError> {
        self.seat().await.ok_or(ClientError::NotJoined)
    }

    async fn send(&self, message: ClientMessage) -> Result<(), ClientError> {
        let frame = Frame::encode(self.config.codec, &message)?;
        debug!(event = message.event_name(), "sending");
        self.transport.send(frame).await?;
        Ok(())
    }

    async fn execute(&self, actions: Vec<MirrorAction>) -> Result<Vec<GameEvent>, ClientError> {
        let mut events = Vec::new();
        for action in actions {
            match action {
                MirrorAction::Send(message) => self.send(message).await?,
                MirrorAction::Emit(event) => {
                    if let GameEvent::Rejected { code, message } = &event {
                        warn!(?code, %message, "server rejected request");
                    }
                    events.push(event);
                }
            }
        }
        Ok(events)
    }
}

/// Next identity event, or pending forever when there is no subscription.
async fn next_identity(
    identity: &mut Option<broadcast::Receiver<IdentityEvent>>,
) -> Option<IdentityEvent> {
    let Some(rx) = identity.as_mut() else {
        return std::future::pending().await;
    };
    loop {
        match rx.recv().await {
            Ok(event) => return Some(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "identity events lagged");
            }
            Err(broadcast::error::RecvError::Closed) => {
                *identity = None;
                return std::future::pending().await;
            }
        }
    }
}
