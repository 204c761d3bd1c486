//! UseCase: ルームのチャンネルへの参加（WebSocket の `join`）
//!
//! 招待コードで参加済み（メンバー）のユーザーだけがチャンネルに参加できます。
//!
//! 1. ルームが存在し終了していないこと、ユーザーがメンバーであることを確認
//! 2. 接続をチャンネルに参加させる（別のルームに参加中ならそのルームから退出）
//! 3. 参加した接続に `joined`（ルームと最新クロック）を返す
//! 4. ルームの他の接続に `member_joined` を通知

use std::{sync::Arc, time::Duration};

use crate::domain::{
    ConnectionId, MessagePusher, Room, RoomBroadcast, RoomEvent, RoomId, RoomPubSub,
    RoomRepository, SyncCache, SyncClock, UserId,
};

use super::{DEFAULT_STORE_TIMEOUT, LeaveRoomUseCase, UseCaseError, bounded};

/// チャンネル参加のユースケース
pub struct JoinChannelUseCase {
    repository: Arc<dyn RoomRepository>,
    cache: Arc<dyn SyncCache>,
    message_pusher: Arc<dyn MessagePusher>,
    pubsub: Arc<dyn RoomPubSub>,
    leave_room: Arc<LeaveRoomUseCase>,
    store_timeout: Duration,
}

impl JoinChannelUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        cache: Arc<dyn SyncCache>,
        message_pusher: Arc<dyn MessagePusher>,
        pubsub: Arc<dyn RoomPubSub>,
        leave_room: Arc<LeaveRoomUseCase>,
    ) -> Self {
        Self {
            repository,
            cache,
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

    /// 接続をルームのチャンネルに参加させる
    ///
    /// # Returns
    ///
    /// * `Ok(Room)` - 参加したルーム
    /// * `Err(UseCaseError::NotFound)` - ルームが存在しない、または終了している
    /// * `Err(UseCaseError::Forbidden)` - ユーザーがルームのメンバーでない
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        user_id: UserId,
        room_id: String,
    ) -> Result<Room, UseCaseError> {
        let room_id = RoomId::new(room_id).map_err(|_| UseCaseError::room_not_found())?;
        let room = bounded(
            self.store_timeout,
            "room.find_by_id",
            self.repository.find_by_id(&room_id),
        )
        .await?;
        if room.is_ended() {
            return Err(UseCaseError::room_not_found());
        }
        if !room.is_member(&user_id) {
            return Err(UseCaseError::Forbidden(format!(
                "User '{}' is not a member of room '{}'",
                user_id, room_id
            )));
        }

        let previous = self
            .message_pusher
            .attach(connection_id, room_id.clone())
            .await?;
        let rejoined = previous.as_ref() == Some(&room_id);
        if let Some(previous) = previous.filter(|previous| previous != &room_id) {
            tracing::info!(
                "Connection '{}' switches from room '{}' to '{}'",
                connection_id,
                previous,
                room_id
            );
            if let Err(e) = self.leave_room.execute(user_id.clone(), &previous).await {
                tracing::warn!("Failed to leave previous room '{}': {}", previous, e);
            }
        }

        let clock = self.current_clock(&room).await;
        self.message_pusher
            .push_to(
                connection_id,
                &RoomEvent::Joined {
                    room: room.clone(),
                    clock,
                },
            )
            .await?;

        if !rejoined {
            let broadcast = RoomBroadcast::fanout(
                room_id.clone(),
                RoomEvent::MemberJoined {
                    user_id: user_id.clone(),
                },
            )
            .excluding(connection_id.clone());
            if let Err(e) = bounded(
                self.store_timeout,
                "pubsub.publish",
                self.pubsub.publish(broadcast),
            )
            .await
            {
                tracing::warn!("Failed to announce '{}' in room '{}': {}", user_id, room_id, e);
            }
        }

        tracing::info!(
            "Connection '{}' ({}) joined channel of room '{}'",
            connection_id,
            user_id,
            room_id
        );
        Ok(room)
    }

    /// キャッシュ上の最新クロック。無い・読めない場合は Room に永続化されたクロック。
    async fn current_clock(&self, room: &Room) -> SyncClock {
        match bounded(self.store_timeout, "cache.get", self.cache.get(&room.id)).await {
            Ok(Some(clock)) => clock,
            Ok(None) => {
                tracing::debug!(
                    "No cached clock for room '{}', using persisted clock",
                    room.id
                );
                room.clock.clone()
            }
            Err(e) => {
                tracing::warn!(
                    "Sync cache read failed for room '{}', using persisted clock: {}",
                    room.id,
                    e
                );
                room.clock.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            CacheError, Delivery, MockSyncCache, PlaybackCommand, PlaybackOffset, Timestamp,
        },
        usecase::fixtures::{NOW, TestContext, assert_no_broadcast, next_broadcast, user},
    };

    fn create_usecase(ctx: &TestContext) -> JoinChannelUseCase {
        JoinChannelUseCase::new(
            ctx.repository.clone(),
            ctx.cache.clone(),
            ctx.pusher.clone(),
            ctx.pubsub.clone(),
            Arc::new(ctx.leave_room_usecase()),
        )
    }

    #[tokio::test]
    async fn test_member_joins_channel() {
        // テスト項目: メンバーはチャンネルに参加でき、joined が返り member_joined が通知される
        // given (前提条件):
        let ctx = TestContext::new();
        let room = ctx.create_room("owner", 2).await;
        let room = ctx.add_member(&room, "user2").await;
        let (connection_id, mut rx) = ctx.connect("user2").await;
        let mut broadcasts = ctx.subscribe();
        let usecase = create_usecase(&ctx);

        // when (操作):
        let result = usecase
            .execute(&connection_id, user("user2"), room.id.to_string())
            .await;

        // then (期待する結果):
        assert_eq!(result, Ok(room.clone()));
        assert_eq!(ctx.pusher.room_of(&connection_id).await, Some(room.id.clone()));

        let joined: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(joined["type"], "joined");
        assert_eq!(joined["room"]["id"], room.id.as_str());
        assert_eq!(joined["clock"]["playing"], false);

        let broadcast = next_broadcast(&mut broadcasts).await;
        assert_eq!(
            broadcast.event,
            RoomEvent::MemberJoined {
                user_id: user("user2")
            }
        );
        assert_eq!(broadcast.exclude, Some(connection_id));
        assert_eq!(broadcast.delivery, Delivery::Fanout);
    }

    #[tokio::test]
    async fn test_non_member_cannot_join_channel() {
        // テスト項目: メンバーでないユーザーはチャンネルに参加できない
        // given (前提条件):
        let ctx = TestContext::new();
        let room = ctx.create_room("owner", 2).await;
        let (connection_id, _rx) = ctx.connect("stranger").await;
        let usecase = create_usecase(&ctx);

        // when (操作):
        let result = usecase
            .execute(&connection_id, user("stranger"), room.id.to_string())
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(UseCaseError::Forbidden(_))));
        assert_eq!(ctx.pusher.room_of(&connection_id).await, None);
    }

    #[tokio::test]
    async fn test_cannot_join_ended_room_channel() {
        // テスト項目: 終了したルームのチャンネルには参加できない
        // given (前提条件):
        let ctx = TestContext::new();
        let room = ctx.create_room("owner", 2).await;
        ctx.add_member(&room, "user2").await;
        ctx.leave_room_usecase()
            .execute(user("owner"), &room.id)
            .await
            .unwrap();
        let (connection_id, _rx) = ctx.connect("user2").await;
        let usecase = create_usecase(&ctx);

        // when (操作):
        let result = usecase
            .execute(&connection_id, user("user2"), room.id.to_string())
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(UseCaseError::room_not_found()));
    }

    #[tokio::test]
    async fn test_joined_clock_falls_back_to_persisted_clock() {
        // テスト項目: キャッシュが失われていても Room に永続化されたクロックが返る
        // given (前提条件):
        let ctx = TestContext::new();
        let room = ctx.create_room("owner", 2).await;
        let persisted = SyncClock::from_command(
            PlaybackCommand::Play,
            PlaybackOffset::new(42.0).unwrap(),
            false,
            Timestamp::new(NOW),
            user("owner"),
        );
        ctx.repository
            .save_clock(&room.id, PlaybackCommand::Play, persisted)
            .await
            .unwrap();
        let mut cache = MockSyncCache::new();
        cache
            .expect_get()
            .returning(|_| Err(CacheError::Unavailable("down".to_string())));
        let (connection_id, mut rx) = ctx.connect("owner").await;
        let usecase = JoinChannelUseCase::new(
            ctx.repository.clone(),
            Arc::new(cache),
            ctx.pusher.clone(),
            ctx.pubsub.clone(),
            Arc::new(ctx.leave_room_usecase()),
        );

        // when (操作):
        usecase
            .execute(&connection_id, user("owner"), room.id.to_string())
            .await
            .unwrap();

        // then (期待する結果):
        let joined: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(joined["clock"]["offset"], 42.0);
        assert_eq!(joined["clock"]["playing"], true);
    }

    #[tokio::test]
    async fn test_joining_second_room_leaves_first() {
        // テスト項目: 別のルームに参加すると、それまでのルームから退出する
        // given (前提条件):
        let ctx = TestContext::new();
        let first = ctx.create_room("alice", 3).await;
        let second = ctx.create_room("bob", 3).await;
        ctx.add_member(&first, "carol").await;
        ctx.add_member(&second, "carol").await;
        let (connection_id, _rx) = ctx.connect("carol").await;
        let usecase = create_usecase(&ctx);
        usecase
            .execute(&connection_id, user("carol"), first.id.to_string())
            .await
            .unwrap();

        // when (操作):
        usecase
            .execute(&connection_id, user("carol"), second.id.to_string())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(ctx.pusher.room_of(&connection_id).await, Some(second.id));
        let first = ctx.repository.find_by_id(&first.id).await.unwrap();
        assert!(!first.is_member(&user("carol")));
    }

    #[tokio::test]
    async fn test_rejoining_same_room_does_not_announce_again() {
        // テスト項目: 同じルームに再度 join しても member_joined は重複して通知されない
        // given (前提条件):
        let ctx = TestContext::new();
        let room = ctx.create_room("owner", 2).await;
        let (connection_id, _rx) = ctx.connect("owner").await;
        let usecase = create_usecase(&ctx);
        usecase
            .execute(&connection_id, user("owner"), room.id.to_string())
            .await
            .unwrap();
        let mut broadcasts = ctx.subscribe();

        // when (操作):
        let result = usecase
            .execute(&connection_id, user("owner"), room.id.to_string())
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_no_broadcast(&mut broadcasts).await;
    }
}
