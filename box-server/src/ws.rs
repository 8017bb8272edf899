//! WebSocket endpoint.
//!
//! One task per connection. The task reads frames, hands them to the
//! [`Session`], and forwards room broadcasts. Replies go out in the codec
//! of the client's most recent frame: JSON for text, MessagePack for
//! binary.

use crate::server::Coordinator;
use crate::session::{Reply, Session};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::Extension;
use box_types::{ServerMessage, WireCodec, WireError};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

/// Largest frame accepted from a client (64 KB).
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Upgrade handler mounted at `server.ws_path`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(coordinator): Extension<Arc<Coordinator>>,
) -> impl IntoResponse {
    ws.max_message_size(MAX_FRAME_SIZE)
        .on_upgrade(move |socket| run_connection(coordinator, socket))
}

/// Drive one connection until it closes.
pub async fn run_connection(coordinator: Arc<Coordinator>, socket: WebSocket) {
    let join_timeout = Duration::from_secs(coordinator.config().limits.join_timeout_secs);
    let (mut sender, mut receiver) = socket.split();
    let mut session = Session::new(coordinator);
    let connection = session.connection();
    let mut codec = WireCodec::Json;
    let mut events: Option<broadcast::Receiver<ServerMessage>> = None;
    let mut joined = false;

    let join_deadline = tokio::time::sleep(join_timeout);
    tokio::pin!(join_deadline);

    tracing::info!(connection, "connection opened");

    'connection: loop {
        let replies = tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    codec = WireCodec::Json;
                    session.handle_frame(codec, text.as_bytes()).await
                }
                Some(Ok(Message::Binary(bytes))) => {
                    codec = WireCodec::MessagePack;
                    session.handle_frame(codec, &bytes).await
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Pings are answered by axum.
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::debug!(connection, "receive error: {}", e);
                    break;
                }
            },
            event = next_event(&mut events) => match event {
                Ok(message) => vec![Reply::Send(message)],
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(connection, skipped, "broadcast lagged, resyncing");
                    session.resync().await
                }
                Err(RecvError::Closed) => vec![Reply::Unsubscribe],
            },
            () = &mut join_deadline, if !joined => {
                tracing::warn!(connection, "no join within {}s", join_timeout.as_secs());
                break;
            }
        };

        for reply in replies {
            match reply {
                Reply::Send(message) => {
                    let frame = match encode(codec, &message) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::error!(connection, "failed to encode {}: {}", message.event_name(), e);
                            continue;
                        }
                    };
                    if let Err(e) = sender.send(frame).await {
                        tracing::debug!(connection, "send error: {}", e);
                        break 'connection;
                    }
                }
                Reply::Subscribe(receiver) => {
                    events = Some(receiver);
                    joined = true;
                }
                Reply::Unsubscribe => events = None,
            }
        }
    }

    session.close().await;
    tracing::info!(connection, "connection closed");
}

/// Next room broadcast; never resolves without a subscription.
async fn next_event(
    events: &mut Option<broadcast::Receiver<ServerMessage>>,
) -> Result<ServerMessage, RecvError> {
    match events {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

/// Encode a message as a WebSocket frame.
pub fn encode(codec: WireCodec, message: &ServerMessage) -> Result<Message, WireError> {
    match codec {
        WireCodec::Json => message.to_json().map(Message::Text),
        WireCodec::MessagePack => codec.encode(message).map(Message::Binary),
    }
}
