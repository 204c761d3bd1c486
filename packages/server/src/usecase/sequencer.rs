//! ルームごとの再生クロック更新の直列化
//!
//! 同じルームへのクロック更新は到着順に 1 つずつ処理します。
//! 異なるルームの更新は互いに待ちません。

use std::{collections::HashMap, future::Future, sync::Arc};

use tokio::sync::Mutex;

use crate::domain::RoomId;

/// ルームごとの FIFO ロック
///
/// `tokio::sync::Mutex` は待機順に取得されるため、到着順が保たれる。
/// 誰も待っていないルームのエントリは処理完了時に削除する。
#[derive(Default)]
pub struct RoomSequencer {
    lanes: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl RoomSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `task` を同じルームの他の処理と直列に実行する
    pub async fn run<F, T>(&self, room_id: &RoomId, task: F) -> T
    where
        F: Future<Output = T>,
    {
        let lane = {
            let mut lanes = self.lanes.lock().await;
            lanes.entry(room_id.clone()).or_default().clone()
        };

        let output = {
            let _turn = lane.lock().await;
            task.await
        };

        let mut lanes = self.lanes.lock().await;
        // map と自分以外に参照が無ければ待機中の処理は無い
        if Arc::strong_count(&lane) == 2 {
            lanes.remove(room_id);
        }
        output
    }

    /// 処理中・待機中のルーム数
    pub async fn active_rooms(&self) -> usize {
        self.lanes.lock().await.len()
    }
}
