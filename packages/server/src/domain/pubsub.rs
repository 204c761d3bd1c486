//! Pub/Sub trait 定義
//!
//! ルームのイベントは、そのルームの接続を保持しているすべてのゲートウェイプロセスに
//! 届ける必要があります。発行側は `RoomPubSub::publish` に渡すだけで、
//! 各プロセスの購読タスクが自プロセスの接続へ配信します。

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use super::{ConnectionId, PubSubError, RoomEvent, RoomId, UserId};

/// 配信後に受信側プロセスが行う後処理
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// 配信のみ
    Fanout,
    /// 配信後、指定ユーザーの接続をチャンネルから外す（退出・キック）
    Evict(UserId),
    /// 配信後、ルームのすべての接続をチャンネルから外す（ルーム終了）
    Close,
}

/// ルームへのブロードキャスト要求
#[derive(Debug, Clone, PartialEq)]
pub struct RoomBroadcast {
    pub room_id: RoomId,
    pub event: RoomEvent,
    pub delivery: Delivery,
    /// 配信しない接続（送信元など）
    pub exclude: Option<ConnectionId>,
}

impl RoomBroadcast {
    pub fn fanout(room_id: RoomId, event: RoomEvent) -> Self {
        Self {
            room_id,
            event,
            delivery: Delivery::Fanout,
            exclude: None,
        }
    }

    pub fn excluding(mut self, connection_id: ConnectionId) -> Self {
        self.exclude = Some(connection_id);
        self
    }

    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }
}

/// 購読ストリームの要素
#[derive(Debug, Clone, PartialEq)]
pub enum PubSubMessage {
    Broadcast(RoomBroadcast),
    /// 購読側が遅れ、指定件数のブロードキャストを読み飛ばした
    ///
    /// 読み飛ばした中に `Evict` / `Close` があった可能性があるため、
    /// 受信側はチャンネルの参加状態を Room Store と突き合わせ直す。
    Lagged(u64),
}

/// プロセス間でルームのイベントを配る Pub/Sub
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomPubSub: Send + Sync {
    async fn publish(&self, broadcast: RoomBroadcast) -> Result<(), PubSubError>;

    /// 以降に発行されるブロードキャストを購読する
    fn subscribe(&self) -> BoxStream<'static, PubSubMessage>;
}
