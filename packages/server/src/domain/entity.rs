//! エンティティ定義
//!
//! - `Room`: ウォッチパーティのセッション（永続化対象）
//! - `SyncClock`: オーナーが生成する権威的な再生クロック
//! - `ChatMessage` / `Reaction`: ブロードキャストのみの一時的な値

use super::{
    error::RoomError,
    value_object::{
        ContentId, EmojiToken, InviteCode, MessageText, PlaybackOffset, RoomCapacity, RoomId,
        Timestamp, UserId,
    },
};

/// ルームの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Waiting,
    Playing,
    Paused,
    Ended,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Ended => "ended",
        }
    }
}

/// オーナーの再生操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Seek,
}

impl PlaybackCommand {
    /// 操作後の再生フラグ。seek は直前の再生フラグを引き継ぐ。
    pub fn playing_after(&self, previously_playing: bool) -> bool {
        match self {
            Self::Play => true,
            Self::Pause => false,
            Self::Seek => previously_playing,
        }
    }

    /// 操作後のルーム状態。seek は状態を変えない。
    pub fn status_after(&self, current: RoomStatus) -> RoomStatus {
        match self {
            Self::Play => RoomStatus::Playing,
            Self::Pause => RoomStatus::Paused,
            Self::Seek => current,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Seek => "seek",
        }
    }
}

/// 権威的な再生クロック
///
/// 新しいクロックは常に前のクロックを完全に置き換える（マージしない）。
#[derive(Debug, Clone, PartialEq)]
pub struct SyncClock {
    /// `server_time` 時点の再生位置
    pub offset: PlaybackOffset,
    pub playing: bool,
    /// サーバーが offset を記録した時刻
    pub server_time: Timestamp,
    /// クロックを生成したユーザー（常にオーナー）
    pub updated_by: UserId,
}

impl SyncClock {
    /// ルーム作成時のクロック（位置 0、一時停止）
    pub fn initial(owner_id: UserId, created_at: Timestamp) -> Self {
        Self {
            offset: PlaybackOffset::ZERO,
            playing: false,
            server_time: created_at,
            updated_by: owner_id,
        }
    }

    /// 再生操作からクロックを生成する
    pub fn from_command(
        command: PlaybackCommand,
        offset: PlaybackOffset,
        previously_playing: bool,
        now: Timestamp,
        author: UserId,
    ) -> Self {
        Self {
            offset,
            playing: command.playing_after(previously_playing),
            server_time: now,
            updated_by: author,
        }
    }

    /// `now` 時点での再生位置（秒）
    ///
    /// 再生中なら `offset + (now - server_time)`、停止中なら `offset`。
    /// 時計の逆行で経過時間が負になる場合は 0 として扱う。
    pub fn projected_offset(&self, now: Timestamp) -> f64 {
        if !self.playing {
            return self.offset.seconds();
        }
        let elapsed_millis = (now.value() - self.server_time.value()).max(0);
        self.offset.seconds() + elapsed_millis as f64 / 1000.0
    }
}

/// 参加操作の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Added,
    /// すでにメンバーだった（冪等）
    Unchanged,
}

/// 退出操作の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// オーナーが退出し、ルームが終了した
    EndedRoom,
    /// 一般メンバーが退出した
    Removed,
    /// メンバーではなかった（冪等）
    Unchanged,
}

/// ウォッチパーティのルーム
///
/// ## 不変条件
///
/// - オーナーは常に `members` に含まれる
/// - `status == Ended` ⇔ オーナーが退出済み
/// - `members.len() <= capacity`
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub owner_id: UserId,
    pub content_id: ContentId,
    pub invite_code: InviteCode,
    /// 参加順に保持するが、順序に意味はない（集合として扱う）
    pub members: Vec<UserId>,
    pub capacity: RoomCapacity,
    pub is_private: bool,
    pub status: RoomStatus,
    /// 最後に永続化されたクロック（キャッシュ消失時のフォールバック）
    pub clock: SyncClock,
    pub created_at: Timestamp,
}

impl Room {
    /// 新しいルームを作成する。オーナーは自動的に参加する。
    pub fn new(
        id: RoomId,
        owner_id: UserId,
        content_id: ContentId,
        invite_code: InviteCode,
        capacity: RoomCapacity,
        is_private: bool,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            members: vec![owner_id.clone()],
            clock: SyncClock::initial(owner_id.clone(), created_at),
            owner_id,
            content_id,
            invite_code,
            capacity,
            is_private,
            status: RoomStatus::Waiting,
            created_at,
        }
    }

    pub fn is_owner(&self, user_id: &UserId) -> bool {
        &self.owner_id == user_id
    }

    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.members.contains(user_id)
    }

    pub fn is_ended(&self) -> bool {
        self.status == RoomStatus::Ended
    }

    /// メンバーを追加する
    ///
    /// # Errors
    ///
    /// - `RoomError::Ended`: ルームが終了している
    /// - `RoomError::Full`: 定員に達している
    pub fn add_member(&mut self, user_id: UserId) -> Result<MembershipChange, RoomError> {
        if self.is_ended() {
            return Err(RoomError::Ended);
        }
        if self.is_member(&user_id) {
            return Ok(MembershipChange::Unchanged);
        }
        if self.members.len() >= self.capacity.value() {
            return Err(RoomError::Full {
                capacity: self.capacity.value(),
            });
        }
        self.members.push(user_id);
        Ok(MembershipChange::Added)
    }

    /// メンバーを退出させる
    ///
    /// オーナーの場合はメンバーに残したままルームを終了する。
    pub fn remove_member(&mut self, user_id: &UserId) -> Departure {
        if self.is_owner(user_id) {
            if self.is_ended() {
                return Departure::Unchanged;
            }
            self.status = RoomStatus::Ended;
            return Departure::EndedRoom;
        }
        if !self.is_member(user_id) {
            return Departure::Unchanged;
        }
        self.members.retain(|m| m != user_id);
        Departure::Removed
    }

    /// オーナーがメンバーをキックする
    pub fn kick(&mut self, by: &UserId, target: &UserId) -> Result<(), RoomError> {
        if self.is_ended() {
            return Err(RoomError::Ended);
        }
        if !self.is_owner(by) {
            return Err(RoomError::NotOwner);
        }
        if self.is_owner(target) {
            return Err(RoomError::CannotKickOwner);
        }
        if !self.is_member(target) {
            return Err(RoomError::NotMember);
        }
        self.members.retain(|m| m != target);
        Ok(())
    }

    /// 新しいクロックで置き換え、操作に応じて状態を遷移させる
    pub fn apply_clock(
        &mut self,
        command: PlaybackCommand,
        clock: SyncClock,
    ) -> Result<(), RoomError> {
        if self.is_ended() {
            return Err(RoomError::Ended);
        }
        if !self.is_owner(&clock.updated_by) {
            return Err(RoomError::NotOwner);
        }
        self.status = command.status_after(self.status);
        self.clock = clock;
        Ok(())
    }
}

/// チャットメッセージ（ブロードキャストのみ、保存しない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub from: UserId,
    pub text: MessageText,
    pub sent_at: Timestamp,
}

/// リアクション（ブロードキャストのみ、保存しない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub from: UserId,
    pub token: EmojiToken,
    pub sent_at: Timestamp,
}
