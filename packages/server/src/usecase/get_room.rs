//! UseCase: ルーム取得

use std::{sync::Arc, time::Duration};

use crate::domain::{Room, RoomId, RoomRepository};

use super::{DEFAULT_STORE_TIMEOUT, UseCaseError, bounded};

/// ルーム取得のユースケース
pub struct GetRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    store_timeout: Duration,
}

impl GetRoomUseCase {
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

    /// ルームを ID で取得する（終了済みのルームも返す）
    pub async fn execute(&self, room_id: String) -> Result<Room, UseCaseError> {
        let room_id = RoomId::new(room_id).map_err(|_| UseCaseError::room_not_found())?;
        bounded(
            self.store_timeout,
            "room.find_by_id",
            self.repository.find_by_id(&room_id),
        )
        .await
    }
}
