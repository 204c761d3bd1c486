//! InMemory Sync Cache 実装
//!
//! 期限切れのエントリは読み出し時に削除します（定期的な掃除はしない）。
//! 時刻は `tokio::time::Instant` で計るため、テストでは時間を止めて進められます。
//! 期限が `Instant` の範囲を超える TTL のエントリは期限切れにならない。

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use tokio::{sync::Mutex, time::Instant};

use crate::domain::{CacheError, RoomId, SyncCache, SyncClock};

struct CacheEntry {
    clock: SyncClock,
    /// None = 期限なし
    expires_at: Option<Instant>,
}

/// インメモリ Sync Cache 実装
pub struct InMemorySyncCache {
    entries: Mutex<HashMap<RoomId, CacheEntry>>,
    ttl: Duration,
}

impl InMemorySyncCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// 保持しているエントリ数（期限切れで未削除のものを含む）
    pub async fn entry_count(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl SyncCache for InMemorySyncCache {
    async fn put(&self, room_id: &RoomId, clock: SyncClock) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            room_id.clone(),
            CacheEntry {
                clock,
                expires_at: Instant::now().checked_add(self.ttl),
            },
        );
        Ok(())
    }

    async fn get(&self, room_id: &RoomId) -> Result<Option<SyncClock>, CacheError> {
        let mut entries = self.entries.lock().await;
        match entries.get(room_id) {
            Some(entry) if entry.expires_at.is_none_or(|at| at > Instant::now()) => {
                Ok(Some(entry.clock.clone()))
            }
            Some(_) => {
                tracing::debug!("Cached clock of room '{}' expired", room_id);
                entries.remove(room_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, room_id: &RoomId) -> Result<(), CacheError> {
        self.entries.lock().await.remove(room_id);
        Ok(())
    }
}
