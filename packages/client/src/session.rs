//! WebSocket client session management.

use futures_util::{Sink, SinkExt, StreamExt};
use matinee_server::infrastructure::dto::websocket::{ClientMessage, ServerMessage};
use matinee_shared::time::Clock;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, protocol::Message},
};

use crate::{
    command::{HELP, UserCommand},
    domain::LocalPlayer,
    error::ClientError,
    formatter::MessageFormatter,
    ui::redisplay_prompt,
};

/// State that survives reconnects
#[derive(Debug)]
pub struct SessionMemory {
    room_id: Option<String>,
    /// A `join` was sent and neither `joined` nor `error` has arrived yet
    pending_join: bool,
    player: LocalPlayer,
}

impl SessionMemory {
    pub fn new(room_id: Option<String>, now_millis: i64) -> Self {
        Self {
            room_id,
            pending_join: false,
            player: LocalPlayer::new(now_millis),
        }
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    pub fn player(&self) -> &LocalPlayer {
        &self.player
    }

    /// Track an outgoing command
    fn on_command(&mut self, command: &UserCommand) {
        match command {
            UserCommand::Join(_) => self.pending_join = true,
            UserCommand::Leave => self.room_id = None,
            _ => {}
        }
    }

    /// Update from a server event; returns the new player position when it re-seeked
    pub fn on_event(&mut self, message: &ServerMessage, now_millis: i64) -> Option<f64> {
        match message {
            ServerMessage::Joined { room, clock } => {
                self.room_id = Some(room.id.clone());
                self.pending_join = false;
                self.player.apply_clock(clock, now_millis)
            }
            ServerMessage::VideoPlay(clock)
            | ServerMessage::VideoPause(clock)
            | ServerMessage::VideoSeek(clock) => self.player.apply_clock(clock, now_millis),
            ServerMessage::RoomEnded { room_id } => {
                if self.room_id.as_deref() == Some(room_id.as_str()) {
                    self.room_id = None;
                }
                None
            }
            ServerMessage::Error { .. } if self.pending_join => {
                // 再参加に失敗したルームには以後戻らない
                self.pending_join = false;
                self.room_id = None;
                None
            }
            _ => None,
        }
    }
}

fn session_url(url: &str, token: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}token={}", url, separator, token)
}

/// Run one WebSocket session until the user exits (`Ok`) or the connection drops (`Err`)
pub async fn run_client_session(
    url: &str,
    token: &str,
    input: &mut mpsc::UnboundedReceiver<String>,
    memory: &mut SessionMemory,
    clock: &dyn Clock,
) -> Result<(), ClientError> {
    let (ws_stream, _) = connect_async(session_url(url, token))
        .await
        .map_err(|e| match e {
            tungstenite::Error::Http(response) if response.status().as_u16() == 401 => {
                ClientError::Unauthorized
            }
            other => ClientError::ConnectionError(other.to_string()),
        })?;

    tracing::info!("Connected to watch-party server!");
    println!("\nType /help for commands. Press Ctrl+C to exit.\n");

    let (mut write, mut read) = ws_stream.split();

    if let Some(room_id) = memory.room_id().map(str::to_string) {
        tracing::info!("Joining room '{}'", room_id);
        let command = UserCommand::Join(room_id);
        memory.on_command(&command);
        if let Some(message) = command.into_client_message(0.0) {
            send(&mut write, &message).await?;
        }
    }
    redisplay_prompt();

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    handle_server_text(text.as_str(), memory, clock);
                    redisplay_prompt();
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Server closed the connection");
                    return Err(ClientError::ConnectionError("Connection lost".to_string()));
                }
                Some(Err(e)) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return Err(ClientError::ConnectionError(e.to_string()));
                }
                Some(Ok(_)) => {}
            },
            line = input.recv() => {
                let Some(line) = line else {
                    return Ok(());
                };
                match UserCommand::parse(&line) {
                    Ok(UserCommand::Help) => print!("{}", HELP),
                    Ok(command) => {
                        memory.on_command(&command);
                        let position = memory.player().position_at(clock.now_millis());
                        if let Some(message) = command.into_client_message(position) {
                            send(&mut write, &message).await?;
                        }
                    }
                    Err(e) => println!("{}", e),
                }
                redisplay_prompt();
            }
        }
    }
}

async fn send<S>(write: &mut S, message: &ClientMessage) -> Result<(), ClientError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let json = serde_json::to_string(message)
        .map_err(|e| ClientError::ConnectionError(format!("Failed to encode frame: {}", e)))?;
    write.send(Message::text(json)).await.map_err(|e| {
        tracing::warn!("Failed to send message: {}", e);
        ClientError::ConnectionError(e.to_string())
    })
}

fn handle_server_text(text: &str, memory: &mut SessionMemory, clock: &dyn Clock) {
    let message = match serde_json::from_str::<ServerMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!("Unrecognized frame: {}", e);
            println!("\n{}", text);
            return;
        }
    };

    print!("{}", MessageFormatter::format_event(&message));
    if let Some(position) = memory.on_event(&message, clock.now_millis()) {
        print!("{}", MessageFormatter::format_resync(position));
    }
}
