//! UseCase: 公開ルーム一覧

use std::{sync::Arc, time::Duration};

use crate::domain::{Room, RoomRepository};

use super::{DEFAULT_STORE_TIMEOUT, UseCaseError, bounded};

/// 公開ルーム一覧のユースケース
pub struct ListRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
    store_timeout: Duration,
}

impl ListRoomsUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self {
            repository,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// 非公開でなく終了していないルームを、作成の新しい順に返す
    pub async fn execute(&self) -> Result<Vec<Room>, UseCaseError> {
        let mut rooms = bounded(
            self.store_timeout,
            "room.list_public",
            self.repository.list_public(),
        )
        .await?;
        rooms.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(rooms)
    }
}
