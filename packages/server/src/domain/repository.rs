//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    Departure, InviteCode, MembershipChange, PlaybackCommand, RepositoryError, Room, RoomId,
    SyncClock, UserId,
};

/// Room Repository trait（永続ストア）
///
/// ドメイン層が必要とするデータストアへのインターフェース。
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
///
/// ## 原子性
///
/// 更新系メソッドはすべて「1 ドキュメントに対する 1 回の原子的な操作」として実装すること。
/// 読み出し → 変更 → 書き戻しを await をまたいで行ってはならない
/// （同時に発生した参加・退出・キックで更新が失われるため）。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// 新しい Room を保存（招待コードが重複する場合は Conflict）
    async fn insert(&self, room: Room) -> Result<(), RepositoryError>;

    /// Room を ID で取得
    async fn find_by_id(&self, room_id: &RoomId) -> Result<Room, RepositoryError>;

    /// Room を招待コードで取得
    async fn find_by_invite_code(&self, code: &InviteCode) -> Result<Room, RepositoryError>;

    /// 公開中（非公開でなく、終了していない）の Room 一覧を取得
    async fn list_public(&self) -> Result<Vec<Room>, RepositoryError>;

    /// 招待コードで Room にメンバーを追加
    async fn add_member_by_invite_code(
        &self,
        code: &InviteCode,
        user_id: UserId,
    ) -> Result<(Room, MembershipChange), RepositoryError>;

    /// メンバーを退出させる（オーナーの場合はルームを終了）
    async fn remove_member(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<(Room, Departure), RepositoryError>;

    /// オーナーによるキック
    async fn kick_member(
        &self,
        room_id: &RoomId,
        by: &UserId,
        target: &UserId,
    ) -> Result<Room, RepositoryError>;

    /// クロックを完全に置き換え、操作に応じて状態を遷移させる
    async fn save_clock(
        &self,
        room_id: &RoomId,
        command: PlaybackCommand,
        clock: SyncClock,
    ) -> Result<Room, RepositoryError>;
}
