//! WebSocket session handler.
//!
//! Each connection is authenticated before the upgrade, registered with the
//! message pusher, and then driven by two tasks: one reading client frames
//! and one forwarding server events from the pusher channel.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, ConnectionIdFactory, PlaybackCommand, RoomEvent, UserId},
    infrastructure::dto::websocket::ClientMessage,
    ui::state::AppState,
    usecase::{RelayEvent, UseCaseError},
};

use super::auth::AuthUser;

/// `GET /ws`: upgrade an authenticated request to a session.
///
/// `AuthUser` runs first, so a bad credential is answered with 401 and no upgrade.
pub async fn websocket_handler(
    AuthUser(claims): AuthUser,
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let user_id = claims.user_id;
    tracing::info!("User '{}' is opening a session", user_id);
    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

/// Forward server events queued for this connection to the socket.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: UserId) {
    let connection_id = ConnectionIdFactory::generate();
    let (tx, rx) = mpsc::unbounded_channel();
    state
        .message_pusher
        .register_connection(connection_id.clone(), user_id.clone(), tx)
        .await;
    tracing::info!(
        "Connection '{}' registered for user '{}'",
        connection_id,
        user_id
    );

    let (sender, mut receiver) = socket.split();

    let recv_state = state.clone();
    let recv_connection_id = connection_id.clone();
    let recv_user_id = user_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", recv_connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    handle_text(&recv_state, &recv_connection_id, &recv_user_id, &text).await;
                }
                Message::Binary(_) => {
                    tracing::debug!("Ignoring binary frame from '{}'", recv_connection_id);
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", recv_connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender);

    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // 切断は退出ではない（メンバーは再接続して join し直せる）
    if let Err(e) = state
        .disconnect_usecase
        .execute(&connection_id, user_id.clone())
        .await
    {
        tracing::warn!(
            "Disconnect of '{}' ({}) not fully applied: {}",
            connection_id,
            user_id,
            e
        );
    }
    tracing::info!("Connection '{}' closed", connection_id);
}

/// Dispatch one client frame.
async fn handle_text(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    user_id: &UserId,
    text: &str,
) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!("Malformed frame from '{}': {}", connection_id, e);
            push_error(state, connection_id, format!("Malformed message: {}", e)).await;
            return;
        }
    };

    match message {
        ClientMessage::Join { room_id } => {
            if let Err(e) = state
                .join_channel_usecase
                .execute(connection_id, user_id.clone(), room_id)
                .await
            {
                push_error(state, connection_id, e.to_string()).await;
            }
        }
        ClientMessage::Leave => {
            let Some(room_id) = state.message_pusher.detach(connection_id).await else {
                tracing::debug!("Connection '{}' left without a room", connection_id);
                return;
            };
            if let Err(e) = state
                .leave_room_usecase
                .execute(user_id.clone(), &room_id)
                .await
            {
                tracing::warn!("Leave of room '{}' failed: {}", room_id, e);
            }
        }
        ClientMessage::Play { offset } => {
            control(state, connection_id, user_id, PlaybackCommand::Play, offset).await;
        }
        ClientMessage::Pause { offset } => {
            control(state, connection_id, user_id, PlaybackCommand::Pause, offset).await;
        }
        ClientMessage::Seek { offset } => {
            control(state, connection_id, user_id, PlaybackCommand::Seek, offset).await;
        }
        ClientMessage::BufferStart => {
            relay(state, connection_id, user_id, RelayEvent::Buffering(true)).await;
        }
        ClientMessage::BufferEnd => {
            relay(state, connection_id, user_id, RelayEvent::Buffering(false)).await;
        }
        ClientMessage::Message { text } => {
            relay(state, connection_id, user_id, RelayEvent::Message(text)).await;
        }
        ClientMessage::Emoji { token } => {
            relay(state, connection_id, user_id, RelayEvent::Reaction(token)).await;
        }
        ClientMessage::Kick { target_user_id } => {
            let Some(room_id) = state.message_pusher.room_of(connection_id).await else {
                return;
            };
            let Ok(target) = UserId::new(target_user_id) else {
                tracing::debug!("Dropping kick with an invalid target from '{}'", user_id);
                return;
            };
            if let Err(e) = state
                .kick_member_usecase
                .execute(user_id, &room_id, target)
                .await
            {
                tracing::debug!("Dropping kick from '{}': {}", user_id, e);
            }
        }
    }
}

/// Playback commands are silently dropped when rejected; only the log records why.
async fn control(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    user_id: &UserId,
    command: PlaybackCommand,
    offset: f64,
) {
    let Some(room_id) = state.message_pusher.room_of(connection_id).await else {
        tracing::debug!(
            "Dropping {} from '{}': not in a room",
            command.as_str(),
            connection_id
        );
        return;
    };

    match state
        .playback_control_usecase
        .execute(user_id.clone(), &room_id, command, offset)
        .await
    {
        Ok(_) => {}
        Err(e @ UseCaseError::StoreUnavailable(_)) => {
            tracing::warn!("{} in room '{}' failed: {}", command.as_str(), room_id, e);
        }
        Err(e) => {
            tracing::debug!(
                "Dropping {} from '{}' in room '{}': {}",
                command.as_str(),
                user_id,
                room_id,
                e
            );
        }
    }
}

async fn relay(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    user_id: &UserId,
    event: RelayEvent,
) {
    if let Err(e) = state
        .relay_event_usecase
        .execute(connection_id, user_id.clone(), event)
        .await
    {
        push_error(state, connection_id, e.to_string()).await;
    }
}

async fn push_error(state: &Arc<AppState>, connection_id: &ConnectionId, message: String) {
    if let Err(e) = state
        .message_pusher
        .push_to(connection_id, &RoomEvent::error(message))
        .await
    {
        tracing::debug!("Could not deliver error to '{}': {}", connection_id, e);
    }
}
