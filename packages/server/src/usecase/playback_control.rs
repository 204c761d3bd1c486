//! UseCase: 再生操作（play / pause / seek）
//!
//! オーナーの操作だけを受け付け、サーバー時刻でスタンプした新しいクロックを
//! Room Store → Sync Cache の順に保存し、送信者を含むルーム全体に配信します。
//!
//! 受け付けなかった操作（オーナー以外、終了済みのルーム、不正な位置、ストア障害）は
//! クロックを変更せず、何も配信しません。呼び出し側はエラーをログに残して破棄します。
//!
//! 同じルームへの操作は `RoomSequencer` で到着順に 1 つずつ処理します。
//! レーンはルームの退出処理と共有します（`with_sequencer`）。
//!
//! 保存後の配信だけが失敗した場合、クロックは保存済みのまま操作はエラーになります。
//! 次に受け付けた操作の配信か、`join` 時の最新クロックの返送で他の接続も追いつきます。

use std::{sync::Arc, time::Duration};

use matinee_shared::time::Clock;

use crate::domain::{
    PlaybackCommand, PlaybackOffset, RoomBroadcast, RoomEvent, RoomId, RoomPubSub,
    RoomRepository, SyncCache, SyncClock, Timestamp, UserId,
};

use super::{DEFAULT_STORE_TIMEOUT, RoomSequencer, UseCaseError, bounded};

/// 再生操作のユースケース
pub struct PlaybackControlUseCase {
    repository: Arc<dyn RoomRepository>,
    cache: Arc<dyn SyncCache>,
    pubsub: Arc<dyn RoomPubSub>,
    clock: Arc<dyn Clock>,
    sequencer: Arc<RoomSequencer>,
    store_timeout: Duration,
}

impl PlaybackControlUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        cache: Arc<dyn SyncCache>,
        pubsub: Arc<dyn RoomPubSub>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            cache,
            pubsub,
            clock,
            sequencer: Arc::new(RoomSequencer::new()),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    pub fn with_sequencer(mut self, sequencer: Arc<RoomSequencer>) -> Self {
        self.sequencer = sequencer;
        self
    }

    /// 再生操作を適用して配信する
    ///
    /// # Arguments
    ///
    /// * `user_id` - 操作したユーザー（オーナーでなければ拒否）
    /// * `room_id` - 接続が参加しているルーム
    /// * `command` - play / pause / seek
    /// * `offset` - クライアントが観測した再生位置（秒）
    ///
    /// # Returns
    ///
    /// * `Ok(SyncClock)` - 配信した新しいクロック
    /// * `Err(UseCaseError)` - 拒否された（配信の失敗を除き、クロックは変更されていない）
    pub async fn execute(
        &self,
        user_id: UserId,
        room_id: &RoomId,
        command: PlaybackCommand,
        offset: f64,
    ) -> Result<SyncClock, UseCaseError> {
        let offset = PlaybackOffset::new(offset)?;
        self.sequencer
            .run(room_id, self.apply(user_id, room_id, command, offset))
            .await
    }

    async fn apply(
        &self,
        user_id: UserId,
        room_id: &RoomId,
        command: PlaybackCommand,
        offset: PlaybackOffset,
    ) -> Result<SyncClock, UseCaseError> {
        // 所有者は接続に保持せず、毎回 Room Store で確認する
        let room = bounded(
            self.store_timeout,
            "room.find_by_id",
            self.repository.find_by_id(room_id),
        )
        .await?;
        if room.is_ended() {
            return Err(UseCaseError::room_not_found());
        }
        if !room.is_owner(&user_id) {
            return Err(UseCaseError::Forbidden(format!(
                "'{}' is not the owner of room '{}'",
                user_id, room_id
            )));
        }

        // 直前の再生フラグは Room から読む（Room Store はキャッシュより先に更新される）
        let clock = SyncClock::from_command(
            command,
            offset,
            room.clock.playing,
            Timestamp::new(self.clock.now_millis()),
            user_id,
        );

        bounded(
            self.store_timeout,
            "room.save_clock",
            self.repository.save_clock(room_id, command, clock.clone()),
        )
        .await?;

        if let Err(e) = bounded(
            self.store_timeout,
            "cache.put",
            self.cache.put(room_id, clock.clone()),
        )
        .await
        {
            // キャッシュを消し、読み出しを永続化済みのクロックに戻す
            if let Err(remove_error) = bounded(
                self.store_timeout,
                "cache.remove",
                self.cache.remove(room_id),
            )
            .await
            {
                tracing::warn!(
                    "Failed to drop stale cached clock of room '{}': {}",
                    room_id,
                    remove_error
                );
            }
            return Err(e);
        }

        bounded(
            self.store_timeout,
            "pubsub.publish",
            self.pubsub.publish(RoomBroadcast::fanout(
                room_id.clone(),
                RoomEvent::ClockUpdated {
                    command,
                    clock: clock.clone(),
                },
            )),
        )
        .await?;

        tracing::info!(
            "Room '{}': {} at {:.3}s (playing: {})",
            room_id,
            command.as_str(),
            clock.offset.seconds(),
            clock.playing
        );
        Ok(clock)
    }
}
