//! UseCase: 純粋なファンアウト（バッファリング通知・チャット・リアクション）
//!
//! クロックは変更しません。チャンネルに参加していない接続からのイベントは無視します。

use std::{sync::Arc, time::Duration};

use matinee_shared::time::Clock;

use crate::domain::{
    ChatMessage, ConnectionId, EmojiToken, MessagePusher, MessageText, Reaction, RoomBroadcast,
    RoomEvent, RoomId, RoomPubSub, Timestamp, UserId,
};

use super::{DEFAULT_STORE_TIMEOUT, UseCaseError, bounded};

/// 中継するイベント（未検証）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// `buffer_start` / `buffer_end`
    Buffering(bool),
    Message(String),
    Reaction(String),
}

/// イベント中継のユースケース
pub struct RelayEventUseCase {
    message_pusher: Arc<dyn MessagePusher>,
    pubsub: Arc<dyn RoomPubSub>,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl RelayEventUseCase {
    pub fn new(
        message_pusher: Arc<dyn MessagePusher>,
        pubsub: Arc<dyn RoomPubSub>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            message_pusher,
            pubsub,
            clock,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// 接続が参加しているルームにイベントを中継する
    ///
    /// # Returns
    ///
    /// * `Ok(Some(RoomId))` - 中継したルーム
    /// * `Ok(None)` - 接続がどのルームにも参加していない（何もしない）
    /// * `Err(UseCaseError::BadRequest)` - 本文・トークンが不正
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        user_id: UserId,
        event: RelayEvent,
    ) -> Result<Option<RoomId>, UseCaseError> {
        let Some(room_id) = self.message_pusher.room_of(connection_id).await else {
            tracing::debug!(
                "Connection '{}' is not in a room, ignoring relay event",
                connection_id
            );
            return Ok(None);
        };

        let sent_at = Timestamp::new(self.clock.now_millis());
        let broadcast = match event {
            // バッファリング中であることは他のメンバーにだけ知らせる
            RelayEvent::Buffering(buffering) => RoomBroadcast::fanout(
                room_id.clone(),
                RoomEvent::Buffering { user_id, buffering },
            )
            .excluding(connection_id.clone()),
            RelayEvent::Message(text) => RoomBroadcast::fanout(
                room_id.clone(),
                RoomEvent::Message(ChatMessage {
                    from: user_id,
                    text: MessageText::new(text)?,
                    sent_at,
                }),
            ),
            RelayEvent::Reaction(token) => RoomBroadcast::fanout(
                room_id.clone(),
                RoomEvent::Reaction(Reaction {
                    from: user_id,
                    token: EmojiToken::new(token)?,
                    sent_at,
                }),
            ),
        };

        let kind = broadcast.event.kind();
        bounded(
            self.store_timeout,
            "pubsub.publish",
            self.pubsub.publish(broadcast),
        )
        .await?;
        tracing::debug!("Relayed '{}' to room '{}'", kind, room_id);
        Ok(Some(room_id))
    }
}
