//! UseCase: ルーム退出
//!
//! HTTP の `DELETE /rooms/{id}/leave`、WebSocket の `leave`、オーナーの切断で使います。
//!
//! - オーナーの退出: ルームを終了し、キャッシュ上のクロックを削除して
//!   `member_left` → `room_ended` の順に通知する（全接続をチャンネルから外す）
//! - メンバーの退出: メンバーから外して `member_left` を通知する（その人の接続をチャンネルから外す）
//! - メンバーでない・ルームが存在しない: 何もしない
//!
//! 再生操作と同じ `RoomSequencer` のレーンで実行するため、処理中の再生操作が
//! 終了後のルームにクロックを書き戻すことはない。

use std::{sync::Arc, time::Duration};

use crate::domain::{
    Delivery, Departure, RoomBroadcast, RoomEvent, RoomId, RoomPubSub, RoomRepository, SyncCache,
    UserId,
};

use super::{DEFAULT_STORE_TIMEOUT, RoomSequencer, UseCaseError, bounded};

/// ルーム退出のユースケース
pub struct LeaveRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    cache: Arc<dyn SyncCache>,
    pubsub: Arc<dyn RoomPubSub>,
    sequencer: Arc<RoomSequencer>,
    store_timeout: Duration,
}

impl LeaveRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        cache: Arc<dyn SyncCache>,
        pubsub: Arc<dyn RoomPubSub>,
    ) -> Self {
        Self {
            repository,
            cache,
            pubsub,
            sequencer: Arc::new(RoomSequencer::new()),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// 再生操作と共有するレーン
    pub fn with_sequencer(mut self, sequencer: Arc<RoomSequencer>) -> Self {
        self.sequencer = sequencer;
        self
    }

    /// ルームから退出する（冪等）
    ///
    /// # Returns
    ///
    /// * `Ok(Departure)` - 退出の結果（変化が無ければ `Departure::Unchanged`）
    /// * `Err(UseCaseError::StoreUnavailable)` - Room Store の障害
    pub async fn execute(
        &self,
        user_id: UserId,
        room_id: &RoomId,
    ) -> Result<Departure, UseCaseError> {
        self.sequencer
            .run(room_id, self.depart(user_id, room_id))
            .await
    }

    async fn depart(&self, user_id: UserId, room_id: &RoomId) -> Result<Departure, UseCaseError> {
        let result = bounded(
            self.store_timeout,
            "room.remove_member",
            self.repository.remove_member(room_id, &user_id),
        )
        .await;

        let departure = match result {
            Ok((_, departure)) => departure,
            Err(UseCaseError::NotFound { .. }) => {
                tracing::debug!("Room '{}' not found on leave, nothing to do", room_id);
                return Ok(Departure::Unchanged);
            }
            Err(e) => return Err(e),
        };

        match departure {
            Departure::EndedRoom => {
                tracing::info!("Owner '{}' left, room '{}' ended", user_id, room_id);
                if let Err(e) = bounded(
                    self.store_timeout,
                    "cache.remove",
                    self.cache.remove(room_id),
                )
                .await
                {
                    // TTL で自然に消えるため、削除できなくても続行する
                    tracing::warn!("Failed to drop cached clock of room '{}': {}", room_id, e);
                }
                self.publish(RoomBroadcast::fanout(
                    room_id.clone(),
                    RoomEvent::MemberLeft { user_id },
                ))
                .await;
                self.publish(
                    RoomBroadcast::fanout(
                        room_id.clone(),
                        RoomEvent::RoomEnded {
                            room_id: room_id.clone(),
                        },
                    )
                    .with_delivery(Delivery::Close),
                )
                .await;
            }
            Departure::Removed => {
                tracing::info!("User '{}' left room '{}'", user_id, room_id);
                self.publish(
                    RoomBroadcast::fanout(
                        room_id.clone(),
                        RoomEvent::MemberLeft {
                            user_id: user_id.clone(),
                        },
                    )
                    .with_delivery(Delivery::Evict(user_id)),
                )
                .await;
            }
            Departure::Unchanged => {
                tracing::debug!("User '{}' was not in room '{}'", user_id, room_id);
            }
        }
        Ok(departure)
    }

    /// 通知する。失敗はログに残して続行する（Room Store には反映済み）
    async fn publish(&self, broadcast: RoomBroadcast) {
        let room_id = broadcast.room_id.clone();
        let kind = broadcast.event.kind();
        if let Err(e) = bounded(
            self.store_timeout,
            "pubsub.publish",
            self.pubsub.publish(broadcast),
        )
        .await
        {
            tracing::warn!("Failed to publish '{}' to room '{}': {}", kind, room_id, e);
        }
    }
}
