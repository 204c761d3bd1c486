//! UseCase: WebSocket 接続の切断
//!
//! 切断は退出ではありません。メンバーの接続が切れても、メンバーのまま
//! `member_left` を通知するだけで、同じユーザーは再接続して `join` し直せます。
//!
//! - 同じユーザーの別の接続がまだチャンネルに参加している: 何もしない
//! - オーナー: 明示的な退出と同じくルームを終了する（`LeaveRoomUseCase`）
//! - メンバー: `member_left` を通知する（メンバーからは外さない）

use std::{sync::Arc, time::Duration};

use crate::domain::{
    ConnectionId, Departure, MessagePusher, RoomBroadcast, RoomEvent, RoomPubSub, RoomRepository,
    UserId,
};

use super::{DEFAULT_STORE_TIMEOUT, LeaveRoomUseCase, UseCaseError, bounded};

/// 切断処理のユースケース
pub struct DisconnectUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    pubsub: Arc<dyn RoomPubSub>,
    leave_room: Arc<LeaveRoomUseCase>,
    store_timeout: Duration,
}

impl DisconnectUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        pubsub: Arc<dyn RoomPubSub>,
        leave_room: Arc<LeaveRoomUseCase>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            pubsub,
            leave_room,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// 接続を登録解除し、参加していたルームに切断を反映する
    ///
    /// # Returns
    ///
    /// * `Ok(Departure::EndedRoom)` - オーナーの切断でルームが終了した
    /// * `Ok(Departure::Unchanged)` - メンバーシップは変わっていない
    /// * `Err(UseCaseError::StoreUnavailable)` - Room Store の障害（接続の登録解除は済んでいる）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        user_id: UserId,
    ) -> Result<Departure, UseCaseError> {
        let Some(room_id) = self
            .message_pusher
            .unregister_connection(connection_id)
            .await
        else {
            return Ok(Departure::Unchanged);
        };

        if self
            .message_pusher
            .attached_users(&room_id)
            .await
            .contains(&user_id)
        {
            tracing::debug!(
                "User '{}' is still attached to room '{}' on another connection",
                user_id,
                room_id
            );
            return Ok(Departure::Unchanged);
        }

        let room = match bounded(
            self.store_timeout,
            "room.find_by_id",
            self.repository.find_by_id(&room_id),
        )
        .await
        {
            Ok(room) => room,
            Err(UseCaseError::NotFound { .. }) => return Ok(Departure::Unchanged),
            Err(e) => return Err(e),
        };
        if room.is_ended() || !room.is_member(&user_id) {
            return Ok(Departure::Unchanged);
        }

        if room.is_owner(&user_id) {
            tracing::info!("Owner '{}' disconnected from room '{}'", user_id, room_id);
            return self.leave_room.execute(user_id, &room_id).await;
        }

        tracing::info!("Member '{}' disconnected from room '{}'", user_id, room_id);
        let broadcast = RoomBroadcast::fanout(room_id.clone(), RoomEvent::MemberLeft { user_id });
        if let Err(e) = bounded(
            self.store_timeout,
            "pubsub.publish",
            self.pubsub.publish(broadcast),
        )
        .await
        {
            tracing::warn!("Failed to announce disconnect in room '{}': {}", room_id, e);
        }
        Ok(Departure::Unchanged)
    }
}
