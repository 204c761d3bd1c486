//! UseCase テスト用の共通ヘルパー

use std::{sync::Arc, time::Duration};

use futures_util::{StreamExt, stream::BoxStream};
use matinee_shared::time::{Clock, FixedClock};
use tokio::sync::mpsc;

use crate::{
    domain::{
        ConnectionId, ConnectionIdFactory, ContentId, InviteCodeFactory, MessagePusher,
        PubSubMessage, Room, RoomBroadcast, RoomCapacity, RoomIdFactory, RoomPubSub,
        RoomRepository, SyncCache, Timestamp, UserId,
    },
    infrastructure::{
        cache::{DEFAULT_CLOCK_TTL, InMemorySyncCache},
        message_pusher::WebSocketMessagePusher,
        pubsub::LocalRoomPubSub,
        repository::InMemoryRoomRepository,
    },
};

use super::{DEFAULT_STORE_TIMEOUT, LeaveRoomUseCase};

/// テストで使う固定時刻（2023-11-14T22:13:20Z）
pub(crate) const NOW: i64 = 1_700_000_000_000;

pub(crate) fn user(id: &str) -> UserId {
    UserId::new(id.to_string()).unwrap()
}

/// In-memory 実装で組み立てたテスト用の依存一式
pub(crate) struct TestContext {
    pub repository: Arc<InMemoryRoomRepository>,
    pub cache: Arc<InMemorySyncCache>,
    pub pubsub: Arc<LocalRoomPubSub>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub clock: Arc<FixedClock>,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            repository: Arc::new(InMemoryRoomRepository::new()),
            cache: Arc::new(InMemorySyncCache::new(DEFAULT_CLOCK_TTL)),
            pubsub: Arc::new(LocalRoomPubSub::new()),
            pusher: Arc::new(WebSocketMessagePusher::new()),
            clock: Arc::new(FixedClock::new(NOW)),
        }
    }

    /// オーナーだけが参加したルームを作成し、キャッシュに初期クロックを置く
    pub async fn create_room(&self, owner: &str, capacity: usize) -> Room {
        let room = Room::new(
            RoomIdFactory::generate(),
            user(owner),
            ContentId::new("m1".to_string()).unwrap(),
            InviteCodeFactory::generate(),
            RoomCapacity::new(capacity).unwrap(),
            false,
            Timestamp::new(self.clock.now_millis()),
        );
        self.repository.insert(room.clone()).await.unwrap();
        self.cache.put(&room.id, room.clock.clone()).await.unwrap();
        room
    }

    /// 招待コードでメンバーを追加する
    pub async fn add_member(&self, room: &Room, member: &str) -> Room {
        let (room, _) = self
            .repository
            .add_member_by_invite_code(&room.invite_code, user(member))
            .await
            .unwrap();
        room
    }

    /// 接続を登録する（未参加状態）
    pub async fn connect(&self, member: &str) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let connection_id = ConnectionIdFactory::generate();
        let (tx, rx) = mpsc::unbounded_channel();
        self.pusher
            .register_connection(connection_id.clone(), user(member), tx)
            .await;
        (connection_id, rx)
    }

    /// 発行されたブロードキャストだけを流す購読
    pub fn subscribe(&self) -> BoxStream<'static, RoomBroadcast> {
        self.pubsub
            .subscribe()
            .filter_map(|message| async move {
                match message {
                    PubSubMessage::Broadcast(broadcast) => Some(broadcast),
                    PubSubMessage::Lagged(_) => None,
                }
            })
            .boxed()
    }

    pub fn leave_room_usecase(&self) -> LeaveRoomUseCase {
        LeaveRoomUseCase::new(
            self.repository.clone(),
            self.cache.clone(),
            self.pubsub.clone(),
        )
        .with_store_timeout(DEFAULT_STORE_TIMEOUT)
    }
}

/// 次のブロードキャストを受け取る（1 秒以内に届かなければ panic）
pub(crate) async fn next_broadcast(stream: &mut BoxStream<'static, RoomBroadcast>) -> RoomBroadcast {
    tokio::time::timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("broadcast was not published in time")
        .expect("pubsub stream closed")
}

/// ブロードキャストが発行されていないことを確認する
pub(crate) async fn assert_no_broadcast(stream: &mut BoxStream<'static, RoomBroadcast>) {
    let result = tokio::time::timeout(Duration::from_millis(50), stream.next()).await;
    assert!(result.is_err(), "unexpected broadcast: {:?}", result);
}
