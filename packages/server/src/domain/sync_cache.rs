//! Sync Cache trait 定義
//!
//! 再生クロックは参加・退出よりもはるかに頻繁に更新されるため、
//! TTL 付きの揮発性ストアに保持します。キャッシュが失われても
//! Room Repository に永続化されたクロックへフォールバックできます。

use async_trait::async_trait;

use super::{CacheError, RoomId, SyncClock};

/// TTL 付きの再生クロックキャッシュ
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SyncCache: Send + Sync {
    /// クロックを無条件に上書きし、TTL をリセットする
    async fn put(&self, room_id: &RoomId, clock: SyncClock) -> Result<(), CacheError>;

    /// 最新のクロックを取得（存在しない・期限切れなら None）
    async fn get(&self, room_id: &RoomId) -> Result<Option<SyncClock>, CacheError>;

    /// クロックを削除する
    async fn remove(&self, room_id: &RoomId) -> Result<(), CacheError>;
}
