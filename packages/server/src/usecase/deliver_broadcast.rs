//! UseCase: Pub/Sub から届いたブロードキャストをこのプロセスの接続に配信
//!
//! 各プロセスの中継タスクが購読したブロードキャストごとに呼び出します。
//! 配信後、`Delivery` に応じて接続をチャンネルから外します。
//!
//! 購読が遅れてブロードキャストを読み飛ばした場合は `resync` で
//! 参加状態を Room Store に合わせ直します。

use std::{sync::Arc, time::Duration};

use crate::domain::{Delivery, MessagePusher, RoomBroadcast, RoomEvent, RoomId, RoomRepository};

use super::{DEFAULT_STORE_TIMEOUT, UseCaseError, bounded};

/// ブロードキャスト配信のユースケース
pub struct DeliverBroadcastUseCase {
    message_pusher: Arc<dyn MessagePusher>,
    repository: Arc<dyn RoomRepository>,
    store_timeout: Duration,
}

impl DeliverBroadcastUseCase {
    pub fn new(
        message_pusher: Arc<dyn MessagePusher>,
        repository: Arc<dyn RoomRepository>,
    ) -> Self {
        Self {
            message_pusher,
            repository,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// ルームに参加している接続に配信し、配信できた接続数を返す
    pub async fn execute(&self, broadcast: RoomBroadcast) -> Result<usize, UseCaseError> {
        let RoomBroadcast {
            room_id,
            event,
            delivery,
            exclude,
        } = broadcast;

        let delivered = self
            .message_pusher
            .broadcast(&room_id, &event, exclude.as_ref())
            .await?;
        tracing::debug!(
            "Delivered '{}' to {} connection(s) in room '{}'",
            event.kind(),
            delivered,
            room_id
        );

        match delivery {
            Delivery::Fanout => {}
            Delivery::Evict(user_id) => {
                let detached = self.message_pusher.detach_user(&room_id, &user_id).await;
                if !detached.is_empty() {
                    tracing::info!(
                        "Detached {} connection(s) of '{}' from room '{}'",
                        detached.len(),
                        user_id,
                        room_id
                    );
                }
            }
            Delivery::Close => {
                let detached = self.message_pusher.detach_room(&room_id).await;
                tracing::info!(
                    "Room '{}' closed, detached {} connection(s)",
                    room_id,
                    detached.len()
                );
            }
        }
        Ok(delivered)
    }

    /// 参加状態を Room Store に合わせ直し、チャンネルから外した接続数を返す
    ///
    /// - 終了した・存在しないルーム: `room_ended` を届けて全接続を外す
    /// - メンバーでなくなったユーザー: その人の接続を外す
    ///
    /// Room Store を読めなかったルームは次の機会まで現状のままにする。
    pub async fn resync(&self) -> usize {
        let mut detached = 0;
        for room_id in self.message_pusher.attached_rooms().await {
            let room = bounded(
                self.store_timeout,
                "room.find_by_id",
                self.repository.find_by_id(&room_id),
            )
            .await;
            match room {
                Ok(room) if !room.is_ended() => {
                    for user_id in self.message_pusher.attached_users(&room_id).await {
                        if room.is_member(&user_id) {
                            continue;
                        }
                        let evicted = self.message_pusher.detach_user(&room_id, &user_id).await;
                        tracing::info!(
                            "Resync detached {} connection(s) of former member '{}' from room '{}'",
                            evicted.len(),
                            user_id,
                            room_id
                        );
                        detached += evicted.len();
                    }
                }
                Ok(_) | Err(UseCaseError::NotFound { .. }) => {
                    detached += self.close(&room_id).await;
                }
                Err(e) => {
                    tracing::warn!("Resync of room '{}' skipped: {}", room_id, e);
                }
            }
        }
        detached
    }

    async fn close(&self, room_id: &RoomId) -> usize {
        let event = RoomEvent::RoomEnded {
            room_id: room_id.clone(),
        };
        if let Err(e) = self.message_pusher.broadcast(room_id, &event, None).await {
            tracing::warn!("Failed to deliver room_ended to room '{}': {}", room_id, e);
        }
        let detached = self.message_pusher.detach_room(room_id).await;
        tracing::info!(
            "Resync closed room '{}', detached {} connection(s)",
            room_id,
            detached.len()
        );
        detached.len()
    }
}
