//! 単一プロセス用の Pub/Sub 実装
//!
//! `tokio::sync::broadcast` チャンネル 1 本ですべてのルームのブロードキャストを流し、
//! 購読側（中継タスク）がルームごとの接続に配信します。
//! 複数プロセス構成では、同じ trait を外部のブローカーで実装します。
//!
//! 容量を超えて遅れた購読者は古いブロードキャストを失います。失った件数は
//! `PubSubMessage::Lagged` としてストリームに流し、中継タスクが接続の参加状態を
//! Room Store から同期し直します（読み飛ばした `Evict` / `Close` の取りこぼし対策）。
//! 読み飛ばしたクロック更新や会話は再送しません。

use async_trait::async_trait;
use futures_util::{
    StreamExt,
    stream::{self, BoxStream},
};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::domain::{PubSubError, PubSubMessage, RoomBroadcast, RoomPubSub};

/// broadcast チャンネルの容量。遅れた購読者はメッセージを読み飛ばす（Lagged）。
const BROADCAST_CAPACITY: usize = 1024;

/// 単一プロセス用の Pub/Sub
pub struct LocalRoomPubSub {
    sender: broadcast::Sender<RoomBroadcast>,
}

impl LocalRoomPubSub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }
}

impl Default for LocalRoomPubSub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomPubSub for LocalRoomPubSub {
    async fn publish(&self, broadcast: RoomBroadcast) -> Result<(), PubSubError> {
        let room_id = broadcast.room_id.clone();
        // 購読者がいない場合（中継タスクの起動前）は配信先が無いだけなので成功扱い
        if self.sender.send(broadcast).is_err() {
            tracing::debug!("No subscribers for room '{}', broadcast dropped", room_id);
        }
        Ok(())
    }

    fn subscribe(&self) -> BoxStream<'static, PubSubMessage> {
        let receiver = self.sender.subscribe();
        stream::unfold(receiver, |mut receiver| async move {
            let message = match receiver.recv().await {
                Ok(broadcast) => PubSubMessage::Broadcast(broadcast),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Pub/Sub subscriber lagged, skipped {} broadcast(s)", skipped);
                    PubSubMessage::Lagged(skipped)
                }
                Err(RecvError::Closed) => return None,
            };
            Some((message, receiver))
        })
        .boxed()
    }
}
