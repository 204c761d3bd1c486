//! HTTP API DTOs.

use serde::{Deserialize, Serialize};

/// Sync clock as exchanged over HTTP and WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncClockDto {
    /// Playback position in seconds at `server_time`
    pub offset: f64,
    pub playing: bool,
    /// Unix epoch milliseconds (UTC) when the offset was captured
    pub server_time: i64,
    pub updated_by: String,
}

/// Room snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDto {
    pub id: String,
    pub owner_id: String,
    pub content_id: String,
    pub invite_code: String,
    pub members: Vec<String>,
    pub max_members: usize,
    pub is_private: bool,
    /// One of `waiting`, `playing`, `paused`, `ended`
    pub status: String,
    pub clock: SyncClockDto,
    /// RFC 3339 (UTC)
    pub created_at: String,
}

/// Body of `POST /rooms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub content_id: String,
    #[serde(default)]
    pub max_members: Option<usize>,
    #[serde(default)]
    pub is_private: bool,
}

/// Error body returned by every failing HTTP endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDto {
    /// One of `not_found`, `forbidden`, `room_full`, `bad_request`, `unauthorized`, `store_unavailable`
    pub error: String,
    pub message: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
}

/// Body of `DELETE /rooms/{id}/leave`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRoomResponse {
    pub room_id: String,
    /// One of `ended_room`, `removed`, `unchanged`
    pub result: String,
}
