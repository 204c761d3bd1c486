//! UseCase: メンバーのキック
//!
//! オーナーだけが実行できます。キックされたユーザーの接続はルームのチャンネルから外れますが、
//! WebSocket 接続そのものは切断しません。

use std::{sync::Arc, time::Duration};

use crate::domain::{
    Delivery, Room, RoomBroadcast, RoomEvent, RoomId, RoomPubSub, RoomRepository, UserId,
};

use super::{DEFAULT_STORE_TIMEOUT, UseCaseError, bounded};

/// メンバーのキックのユースケース
pub struct KickMemberUseCase {
    repository: Arc<dyn RoomRepository>,
    pubsub: Arc<dyn RoomPubSub>,
    store_timeout: Duration,
}

impl KickMemberUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, pubsub: Arc<dyn RoomPubSub>) -> Self {
        Self {
            repository,
            pubsub,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// `target` をルームからキックする
    ///
    /// # Returns
    ///
    /// * `Ok(Room)` - キック後のルーム
    /// * `Err(UseCaseError::Forbidden)` - 実行者がオーナーでない
    /// * `Err(UseCaseError::BadRequest)` - 対象がオーナー、またはメンバーでない
    /// * `Err(UseCaseError::NotFound)` - ルームが存在しない、または終了している
    pub async fn execute(
        &self,
        by: &UserId,
        room_id: &RoomId,
        target: UserId,
    ) -> Result<Room, UseCaseError> {
        let room = bounded(
            self.store_timeout,
            "room.kick_member",
            self.repository.kick_member(room_id, by, &target),
        )
        .await?;

        tracing::info!("User '{}' was kicked from room '{}' by '{}'", target, room_id, by);

        let broadcast = RoomBroadcast::fanout(
            room_id.clone(),
            RoomEvent::MemberKicked {
                user_id: target.clone(),
            },
        )
        .with_delivery(Delivery::Evict(target));
        bounded(
            self.store_timeout,
            "pubsub.publish",
            self.pubsub.publish(broadcast),
        )
        .await?;

        Ok(room)
    }
}
