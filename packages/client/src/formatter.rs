//! Message formatting utilities for client display.

use matinee_server::infrastructure::dto::{
    http::{RoomDto, SyncClockDto},
    websocket::ServerMessage,
};
use matinee_shared::time::timestamp_to_clock_label;

const RULE: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format any server event for the terminal
    pub fn format_event(message: &ServerMessage) -> String {
        match message {
            ServerMessage::Joined { room, clock } => Self::format_joined(room, clock),
            ServerMessage::MemberJoined { user_id } => format!("\n+ {} joined\n", user_id),
            ServerMessage::MemberLeft { user_id } => format!("\n- {} left\n", user_id),
            ServerMessage::MemberKicked { user_id } => {
                format!("\n- {} was kicked by the owner\n", user_id)
            }
            ServerMessage::VideoPlay(clock) => Self::format_clock("play", clock),
            ServerMessage::VideoPause(clock) => Self::format_clock("pause", clock),
            ServerMessage::VideoSeek(clock) => Self::format_clock("seek", clock),
            ServerMessage::VideoBuffer { user_id, buffering } => {
                if *buffering {
                    format!("\n~ {} is buffering...\n", user_id)
                } else {
                    format!("\n~ {} finished buffering\n", user_id)
                }
            }
            ServerMessage::RoomMessage { user_id, text, ts } => format!(
                "\n[{}] @{}: {}\n",
                timestamp_to_clock_label(*ts),
                user_id,
                text
            ),
            ServerMessage::RoomEmoji { user_id, token, ts } => format!(
                "\n[{}] @{} reacted :{}:\n",
                timestamp_to_clock_label(*ts),
                user_id,
                token
            ),
            ServerMessage::RoomEnded { room_id } => {
                format!("\n{}\nRoom {} has ended.\n{}\n", RULE, room_id, RULE)
            }
            ServerMessage::Error { message } => format!("\n! {}\n", message),
        }
    }

    /// Format the room snapshot received on join
    pub fn format_joined(room: &RoomDto, clock: &SyncClockDto) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n\n{}\n", RULE));
        output.push_str(&format!(
            "Room {} (content: {}, invite code: {})\n",
            room.id, room.content_id, room.invite_code
        ));
        output.push_str(&format!(
            "Members ({}/{}):\n",
            room.members.len(),
            room.max_members
        ));
        for member in &room.members {
            let owner_suffix = if *member == room.owner_id {
                " (owner)"
            } else {
                ""
            };
            output.push_str(&format!("  {}{}\n", member, owner_suffix));
        }
        output.push_str(&format!(
            "Status: {}, {} at {}\n",
            room.status,
            if clock.playing { "playing" } else { "stopped" },
            format_offset(clock.offset)
        ));
        output.push_str(&format!("{}\n", RULE));
        output
    }

    fn format_clock(action: &str, clock: &SyncClockDto) -> String {
        format!(
            "\n> {} {} at {}\n",
            clock.updated_by,
            action,
            format_offset(clock.offset)
        )
    }

    /// Format a local re-seek performed to follow the owner
    pub fn format_resync(position: f64) -> String {
        format!("  (re-synced local player to {})\n", format_offset(position))
    }
}

/// Render seconds as `M:SS.s`
pub fn format_offset(seconds: f64) -> String {
    let minutes = (seconds / 60.0).floor();
    let rest = seconds - minutes * 60.0;
    format!("{}:{:04.1}", minutes as u64, rest)
}
