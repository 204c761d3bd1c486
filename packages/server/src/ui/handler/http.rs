//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    domain::{Departure, RoomId},
    infrastructure::dto::http::{CreateRoomRequest, HealthDto, LeaveRoomResponse, RoomDto},
    ui::{error::ApiError, state::AppState},
    usecase::NewRoom,
};

use super::auth::AuthUser;

/// Health check endpoint
pub async fn health_check() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
    })
}

/// `POST /rooms`: create a room owned by the caller
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RoomDto>), ApiError> {
    let Json(request) = payload?;
    let room = state
        .create_room_usecase
        .execute(
            claims.user_id,
            NewRoom {
                content_id: request.content_id,
                max_members: request.max_members,
                is_private: request.is_private,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RoomDto::from(&room))))
}

/// `GET /rooms`: public, non-ended rooms, newest first
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
    AuthUser(_): AuthUser,
) -> Result<Json<Vec<RoomDto>>, ApiError> {
    let rooms = state.list_rooms_usecase.execute().await?;
    Ok(Json(rooms.iter().map(RoomDto::from).collect()))
}

/// `GET /rooms/{room_id}`
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    AuthUser(_): AuthUser,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDto>, ApiError> {
    let room = state.get_room_usecase.execute(room_id).await?;
    Ok(Json(RoomDto::from(&room)))
}

/// `POST /rooms/join/{invite_code}`
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(invite_code): Path<String>,
) -> Result<Json<RoomDto>, ApiError> {
    let room = state
        .join_room_usecase
        .execute(claims.user_id, invite_code)
        .await?;
    Ok(Json(RoomDto::from(&room)))
}

/// `DELETE /rooms/{room_id}/leave`
///
/// Idempotent: leaving a room the caller is not in, or one that does not
/// exist, still answers 200.
pub async fn leave_room(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(room_id): Path<String>,
) -> Result<Json<LeaveRoomResponse>, ApiError> {
    let departure = match RoomId::new(room_id.clone()) {
        Ok(id) => {
            state
                .leave_room_usecase
                .execute(claims.user_id, &id)
                .await?
        }
        Err(_) => Departure::Unchanged,
    };

    let result = match departure {
        Departure::EndedRoom => "ended_room",
        Departure::Removed => "removed",
        Departure::Unchanged => "unchanged",
    };

    Ok(Json(LeaveRoomResponse {
        room_id,
        result: result.to_string(),
    }))
}
