//! MessagePusher trait 定義
//!
//! このプロセスが保持している WebSocket 接続へのメッセージ送信を抽象化します。
//! 接続ごとに「どのルームのチャンネルに参加しているか」も管理します
//! （未参加の接続は `room_of` が None を返す）。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, RoomEvent, RoomId, UserId};

/// 接続へメッセージ（シリアライズ済み JSON）を送るチャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// メッセージ送信の抽象化
///
/// 送信はプロセスローカル。他プロセスへのファンアウトは `RoomPubSub` が担当する。
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続を登録する（この時点ではどのルームにも参加していない）
    async fn register_connection(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        sender: PusherChannel,
    );

    /// 接続を登録解除し、参加していたルームを返す
    async fn unregister_connection(&self, connection_id: &ConnectionId) -> Option<RoomId>;

    /// 接続をルームのチャンネルに参加させ、直前に参加していたルームを返す
    async fn attach(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
    ) -> Result<Option<RoomId>, MessagePushError>;

    /// 接続をチャンネルから外し、参加していたルームを返す
    async fn detach(&self, connection_id: &ConnectionId) -> Option<RoomId>;

    /// 接続が参加しているルーム
    async fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId>;

    /// いずれかの接続が参加しているルーム（重複なし）
    async fn attached_rooms(&self) -> Vec<RoomId>;

    /// ルームに参加している接続のユーザー（重複なし）
    async fn attached_users(&self, room_id: &RoomId) -> Vec<UserId>;

    /// ルームに参加している指定ユーザーの接続をすべてチャンネルから外す
    async fn detach_user(&self, room_id: &RoomId, user_id: &UserId) -> Vec<ConnectionId>;

    /// ルームに参加しているすべての接続をチャンネルから外す
    async fn detach_room(&self, room_id: &RoomId) -> Vec<ConnectionId>;

    /// 特定の接続にイベントを送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &RoomEvent,
    ) -> Result<(), MessagePushError>;

    /// ルームに参加している接続にイベントを送信し、送信できた接続数を返す
    ///
    /// 一部の接続への送信失敗は許容する。
    async fn broadcast(
        &self,
        room_id: &RoomId,
        event: &RoomEvent,
        exclude: Option<&ConnectionId>,
    ) -> Result<usize, MessagePushError>;
}
