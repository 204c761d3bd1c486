//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! 更新系の操作はすべて 1 回のロック取得の中で「読み出し → ドメインモデルの検証付き更新」
//! を行うため、同時に発生した参加・退出・キックで更新が失われることはありません。
//!
//! ## 技術的負債
//!
//! ドメインモデル（`Room`）をそのまま保存しています。永続化を伴う DB を実装する際は
//! `DB Row/JSON → RoomRecord (DTO) → Room (ドメインモデル)` の変換層が必要になります。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Departure, InviteCode, MembershipChange, PlaybackCommand, RepositoryError, Room, RoomId,
    RoomRepository, SyncClock, UserId,
};

#[derive(Default)]
struct RoomTable {
    rooms: HashMap<RoomId, Room>,
    /// 招待コード → ルーム ID の一意インデックス
    invite_codes: HashMap<InviteCode, RoomId>,
}

impl RoomTable {
    fn get_mut(&mut self, room_id: &RoomId) -> Result<&mut Room, RepositoryError> {
        self.rooms
            .get_mut(room_id)
            .ok_or(RepositoryError::NotFound { resource: "Room" })
    }
}

/// インメモリ Room Repository 実装
#[derive(Default)]
pub struct InMemoryRoomRepository {
    table: Mutex<RoomTable>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存されているルーム数（終了済みを含む）
    pub async fn count_rooms(&self) -> usize {
        self.table.lock().await.rooms.len()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn insert(&self, room: Room) -> Result<(), RepositoryError> {
        let mut table = self.table.lock().await;
        if table.invite_codes.contains_key(&room.invite_code) {
            return Err(RepositoryError::Conflict {
                resource: "Room",
                field: "invite_code",
                value: room.invite_code.to_string(),
            });
        }
        if table.rooms.contains_key(&room.id) {
            return Err(RepositoryError::Conflict {
                resource: "Room",
                field: "id",
                value: room.id.to_string(),
            });
        }
        table
            .invite_codes
            .insert(room.invite_code.clone(), room.id.clone());
        table.rooms.insert(room.id.clone(), room);
        Ok(())
    }

    async fn find_by_id(&self, room_id: &RoomId) -> Result<Room, RepositoryError> {
        let table = self.table.lock().await;
        table
            .rooms
            .get(room_id)
            .cloned()
            .ok_or(RepositoryError::NotFound { resource: "Room" })
    }

    async fn find_by_invite_code(&self, code: &InviteCode) -> Result<Room, RepositoryError> {
        let table = self.table.lock().await;
        table
            .invite_codes
            .get(code)
            .and_then(|room_id| table.rooms.get(room_id))
            .cloned()
            .ok_or(RepositoryError::NotFound { resource: "Room" })
    }

    async fn list_public(&self) -> Result<Vec<Room>, RepositoryError> {
        let table = self.table.lock().await;
        Ok(table
            .rooms
            .values()
            .filter(|room| !room.is_private && !room.is_ended())
            .cloned()
            .collect())
    }

    async fn add_member_by_invite_code(
        &self,
        code: &InviteCode,
        user_id: UserId,
    ) -> Result<(Room, MembershipChange), RepositoryError> {
        let mut table = self.table.lock().await;
        let room_id = table
            .invite_codes
            .get(code)
            .cloned()
            .ok_or(RepositoryError::NotFound { resource: "Room" })?;
        let room = table.get_mut(&room_id)?;
        let change = room.add_member(user_id)?;
        Ok((room.clone(), change))
    }

    async fn remove_member(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<(Room, Departure), RepositoryError> {
        let mut table = self.table.lock().await;
        let room = table.get_mut(room_id)?;
        let departure = room.remove_member(user_id);
        Ok((room.clone(), departure))
    }

    async fn kick_member(
        &self,
        room_id: &RoomId,
        by: &UserId,
        target: &UserId,
    ) -> Result<Room, RepositoryError> {
        let mut table = self.table.lock().await;
        let room = table.get_mut(room_id)?;
        room.kick(by, target)?;
        Ok(room.clone())
    }

    async fn save_clock(
        &self,
        room_id: &RoomId,
        command: PlaybackCommand,
        clock: SyncClock,
    ) -> Result<Room, RepositoryError> {
        let mut table = self.table.lock().await;
        let room = table.get_mut(room_id)?;
        room.apply_clock(command, clock)?;
        Ok(room.clone())
    }
}
