//! Conversion logic between DTOs and domain entities.

use matinee_shared::time::timestamp_to_rfc3339;

use crate::domain::{PlaybackCommand, Room, RoomEvent, SyncClock};
use crate::infrastructure::dto::{
    http::{RoomDto, SyncClockDto},
    websocket::ServerMessage,
};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&SyncClock> for SyncClockDto {
    fn from(clock: &SyncClock) -> Self {
        Self {
            offset: clock.offset.seconds(),
            playing: clock.playing,
            server_time: clock.server_time.value(),
            updated_by: clock.updated_by.to_string(),
        }
    }
}

impl From<&Room> for RoomDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.to_string(),
            owner_id: room.owner_id.to_string(),
            content_id: room.content_id.to_string(),
            invite_code: room.invite_code.to_string(),
            members: room.members.iter().map(|member| member.to_string()).collect(),
            max_members: room.capacity.value(),
            is_private: room.is_private,
            status: room.status.as_str().to_string(),
            clock: (&room.clock).into(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

impl From<&RoomEvent> for ServerMessage {
    fn from(event: &RoomEvent) -> Self {
        match event {
            RoomEvent::Joined { room, clock } => Self::Joined {
                room: room.into(),
                clock: clock.into(),
            },
            RoomEvent::MemberJoined { user_id } => Self::MemberJoined {
                user_id: user_id.to_string(),
            },
            RoomEvent::MemberLeft { user_id } => Self::MemberLeft {
                user_id: user_id.to_string(),
            },
            RoomEvent::MemberKicked { user_id } => Self::MemberKicked {
                user_id: user_id.to_string(),
            },
            RoomEvent::ClockUpdated { command, clock } => match command {
                PlaybackCommand::Play => Self::VideoPlay(clock.into()),
                PlaybackCommand::Pause => Self::VideoPause(clock.into()),
                PlaybackCommand::Seek => Self::VideoSeek(clock.into()),
            },
            RoomEvent::Buffering { user_id, buffering } => Self::VideoBuffer {
                user_id: user_id.to_string(),
                buffering: *buffering,
            },
            RoomEvent::Message(message) => Self::RoomMessage {
                user_id: message.from.to_string(),
                text: message.text.as_str().to_string(),
                ts: message.sent_at.value(),
            },
            RoomEvent::Reaction(reaction) => Self::RoomEmoji {
                user_id: reaction.from.to_string(),
                token: reaction.token.as_str().to_string(),
                ts: reaction.sent_at.value(),
            },
            RoomEvent::RoomEnded { room_id } => Self::RoomEnded {
                room_id: room_id.to_string(),
            },
            RoomEvent::Error { message } => Self::Error {
                message: message.clone(),
            },
        }
    }
}
