//! UseCase: 招待コードによるルーム参加
//!
//! メンバーシップ（Room Store）の更新だけを行います。在室の通知は、
//! WebSocket でチャンネルに参加したとき（`JoinChannelUseCase`）に行います。

use std::{sync::Arc, time::Duration};

use crate::domain::{InviteCode, MembershipChange, Room, RoomRepository, UserId};

use super::{DEFAULT_STORE_TIMEOUT, UseCaseError, bounded};

/// 招待コードによるルーム参加のユースケース
pub struct JoinRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    store_timeout: Duration,
}

impl JoinRoomUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self {
            repository,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// 招待コードでルームに参加する
    ///
    /// すでにメンバーの場合は何も変更せずに同じルームを返す。
    ///
    /// # Returns
    ///
    /// * `Ok(Room)` - 参加後のルーム
    /// * `Err(UseCaseError::NotFound)` - コードが存在しない、またはルームが終了している
    /// * `Err(UseCaseError::Capacity)` - 定員に達している
    pub async fn execute(&self, user_id: UserId, invite_code: String) -> Result<Room, UseCaseError> {
        // 形式が不正なコードに一致するルームは存在しない
        let code = InviteCode::new(invite_code).map_err(|_| UseCaseError::room_not_found())?;

        let (room, change) = bounded(
            self.store_timeout,
            "room.add_member",
            self.repository
                .add_member_by_invite_code(&code, user_id.clone()),
        )
        .await?;

        match change {
            MembershipChange::Added => tracing::info!(
                "User '{}' joined room '{}' ({}/{})",
                user_id,
                room.id,
                room.members.len(),
                room.capacity.value()
            ),
            MembershipChange::Unchanged => {
                tracing::debug!("User '{}' is already a member of room '{}'", user_id, room.id)
            }
        }
        Ok(room)
    }
}
