//! ルーム内に配信されるイベント
//!
//! ワイヤー形式（JSON）への変換は Infrastructure 層の DTO が担当します。

use super::{ChatMessage, PlaybackCommand, Reaction, Room, RoomId, SyncClock, UserId};

/// ルーム内の接続に配信されるイベント
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// チャンネル参加の確認（参加した接続にのみ送る）
    ///
    /// `clock` はキャッシュ上の最新クロック。キャッシュに無ければ Room に永続化されたクロック。
    Joined { room: Room, clock: SyncClock },
    MemberJoined {
        user_id: UserId,
    },
    MemberLeft {
        user_id: UserId,
    },
    MemberKicked {
        user_id: UserId,
    },
    /// オーナーの再生操作による新しいクロック
    ClockUpdated {
        command: PlaybackCommand,
        clock: SyncClock,
    },
    Buffering {
        user_id: UserId,
        buffering: bool,
    },
    Message(ChatMessage),
    Reaction(Reaction),
    /// オーナーの退出によりルームが終了した
    RoomEnded {
        room_id: RoomId,
    },
    /// 操作が拒否された（送信した接続にのみ送る）
    Error {
        message: String,
    },
}

impl RoomEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// ログ出力用のイベント名
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Joined { .. } => "joined",
            Self::MemberJoined { .. } => "member_joined",
            Self::MemberLeft { .. } => "member_left",
            Self::MemberKicked { .. } => "member_kicked",
            Self::ClockUpdated { command, .. } => match command {
                PlaybackCommand::Play => "video_play",
                PlaybackCommand::Pause => "video_pause",
                PlaybackCommand::Seek => "video_seek",
            },
            Self::Buffering { .. } => "video_buffer",
            Self::Message(_) => "room_message",
            Self::Reaction(_) => "room_emoji",
            Self::RoomEnded { .. } => "room_ended",
            Self::Error { .. } => "error",
        }
    }
}
