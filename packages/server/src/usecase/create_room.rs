//! UseCase: ルーム作成
//!
//! コンテンツの存在確認 → 定員の検証 → ID と招待コードの生成 → 保存 → Sync Cache の初期化
//! の順に行います。招待コードが衝突した場合は作り直して再試行します。

use std::{sync::Arc, time::Duration};

use matinee_shared::time::Clock;

use crate::domain::{
    ContentCatalog, ContentId, InviteCodeFactory, RepositoryError, Room, RoomCapacity,
    RoomIdFactory, RoomRepository, SyncCache, Timestamp, UserId,
};

use super::{DEFAULT_STORE_TIMEOUT, UseCaseError, bounded};

/// 招待コード衝突時の最大試行回数
const MAX_INVITE_CODE_ATTEMPTS: usize = 5;

/// ルーム作成のリクエスト（未検証）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoom {
    pub content_id: String,
    /// 省略時は上限（10）
    pub max_members: Option<usize>,
    pub is_private: bool,
}

/// ルーム作成のユースケース
pub struct CreateRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    cache: Arc<dyn SyncCache>,
    catalog: Arc<dyn ContentCatalog>,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl CreateRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        cache: Arc<dyn SyncCache>,
        catalog: Arc<dyn ContentCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            cache,
            catalog,
            clock,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// ルームを作成する
    ///
    /// # Returns
    ///
    /// * `Ok(Room)` - 作成されたルーム（オーナーのみ参加、waiting、位置 0 で停止）
    /// * `Err(UseCaseError::BadRequest)` - コンテンツ ID・定員が不正
    /// * `Err(UseCaseError::NotFound)` - コンテンツが存在しない
    /// * `Err(UseCaseError::StoreUnavailable)` - ストア障害
    pub async fn execute(&self, owner_id: UserId, request: NewRoom) -> Result<Room, UseCaseError> {
        let content_id = ContentId::new(request.content_id)?;
        let capacity = match request.max_members {
            Some(max_members) => RoomCapacity::new(max_members)?,
            None => RoomCapacity::default(),
        };

        let exists = bounded(
            self.store_timeout,
            "content.exists",
            self.catalog.exists(&content_id),
        )
        .await?;
        if !exists {
            return Err(UseCaseError::NotFound {
                resource: "Content",
            });
        }

        let room = self
            .insert_with_unique_code(owner_id, content_id, capacity, request.is_private)
            .await?;

        // キャッシュに置けなくても Room の永続化済みクロックで代替できる
        if let Err(e) = bounded(
            self.store_timeout,
            "cache.put",
            self.cache.put(&room.id, room.clock.clone()),
        )
        .await
        {
            tracing::warn!("Failed to seed sync cache for room '{}': {}", room.id, e);
        }

        tracing::info!(
            "Room '{}' created by '{}' (invite code: {}, capacity: {})",
            room.id,
            room.owner_id,
            room.invite_code,
            room.capacity.value()
        );
        Ok(room)
    }

    async fn insert_with_unique_code(
        &self,
        owner_id: UserId,
        content_id: ContentId,
        capacity: RoomCapacity,
        is_private: bool,
    ) -> Result<Room, UseCaseError> {
        for attempt in 1..=MAX_INVITE_CODE_ATTEMPTS {
            let room = Room::new(
                RoomIdFactory::generate(),
                owner_id.clone(),
                content_id.clone(),
                InviteCodeFactory::generate(),
                capacity,
                is_private,
                Timestamp::new(self.clock.now_millis()),
            );
            let result = tokio::time::timeout(self.store_timeout, self.repository.insert(room.clone()))
                .await
                .map_err(|_| UseCaseError::StoreUnavailable("room.insert timed out".to_string()))?;
            match result {
                Ok(()) => return Ok(room),
                Err(RepositoryError::Conflict { value, .. }) => {
                    tracing::warn!(
                        "Invite code '{}' already in use (attempt {}/{})",
                        value,
                        attempt,
                        MAX_INVITE_CODE_ATTEMPTS
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(UseCaseError::StoreUnavailable(
            "could not allocate a unique invite code".to_string(),
        ))
    }
}
