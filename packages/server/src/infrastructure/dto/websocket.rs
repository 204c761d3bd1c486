//! WebSocket frame DTOs.
//!
//! Every frame is a JSON object tagged by `type` (snake_case) with camelCase fields.

use serde::{Deserialize, Serialize};

use super::http::{RoomDto, SyncClockDto};

/// Client → Server events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    Join { room_id: String },
    Leave,
    Play { offset: f64 },
    Pause { offset: f64 },
    Seek { offset: f64 },
    BufferStart,
    BufferEnd,
    Message { text: String },
    Emoji { token: String },
    Kick { target_user_id: String },
}

/// Server → Client events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Joined { room: RoomDto, clock: SyncClockDto },
    MemberJoined { user_id: String },
    MemberLeft { user_id: String },
    MemberKicked { user_id: String },
    VideoPlay(SyncClockDto),
    VideoPause(SyncClockDto),
    VideoSeek(SyncClockDto),
    VideoBuffer { user_id: String, buffering: bool },
    RoomMessage { user_id: String, text: String, ts: i64 },
    RoomEmoji { user_id: String, token: String, ts: i64 },
    RoomEnded { room_id: String },
    Error { message: String },
}
