//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` と、接続が参加しているルームの管理
//! - イベントを `ServerMessage` の JSON に変換して送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//! 送信された文字列は UI 層の送信ループが WebSocket に書き込みます。

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel, RoomEvent, RoomId, UserId},
    infrastructure::dto::websocket::ServerMessage,
};

struct ConnectionEntry {
    user_id: UserId,
    sender: PusherChannel,
    /// 参加しているルーム（None = 未参加）
    room_id: Option<RoomId>,
}

/// WebSocket を使った MessagePusher 実装
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// Key: 接続 ID
    connections: Mutex<HashMap<ConnectionId, ConnectionEntry>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録中の接続数
    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    fn encode(event: &RoomEvent) -> Result<String, MessagePushError> {
        serde_json::to_string(&ServerMessage::from(event))
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_connection(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        sender: PusherChannel,
    ) {
        let mut connections = self.connections.lock().await;
        tracing::debug!(
            "Connection '{}' ({}) registered to MessagePusher",
            connection_id,
            user_id
        );
        connections.insert(
            connection_id,
            ConnectionEntry {
                user_id,
                sender,
                room_id: None,
            },
        );
    }

    async fn unregister_connection(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        let mut connections = self.connections.lock().await;
        let entry = connections.remove(connection_id)?;
        tracing::debug!("Connection '{}' unregistered from MessagePusher", connection_id);
        entry.room_id
    }

    async fn attach(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
    ) -> Result<Option<RoomId>, MessagePushError> {
        let mut connections = self.connections.lock().await;
        let entry = connections
            .get_mut(connection_id)
            .ok_or_else(|| MessagePushError::ConnectionNotFound(connection_id.to_string()))?;
        Ok(entry.room_id.replace(room_id))
    }

    async fn detach(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        let mut connections = self.connections.lock().await;
        connections
            .get_mut(connection_id)
            .and_then(|entry| entry.room_id.take())
    }

    async fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        let connections = self.connections.lock().await;
        connections
            .get(connection_id)
            .and_then(|entry| entry.room_id.clone())
    }

    async fn attached_rooms(&self) -> Vec<RoomId> {
        let connections = self.connections.lock().await;
        let rooms: BTreeSet<&RoomId> = connections
            .values()
            .filter_map(|entry| entry.room_id.as_ref())
            .collect();
        rooms.into_iter().cloned().collect()
    }

    async fn attached_users(&self, room_id: &RoomId) -> Vec<UserId> {
        let connections = self.connections.lock().await;
        let users: BTreeSet<&UserId> = connections
            .values()
            .filter(|entry| entry.room_id.as_ref() == Some(room_id))
            .map(|entry| &entry.user_id)
            .collect();
        users.into_iter().cloned().collect()
    }

    async fn detach_user(&self, room_id: &RoomId, user_id: &UserId) -> Vec<ConnectionId> {
        let mut connections = self.connections.lock().await;
        connections
            .iter_mut()
            .filter(|(_, entry)| {
                entry.room_id.as_ref() == Some(room_id) && &entry.user_id == user_id
            })
            .map(|(connection_id, entry)| {
                entry.room_id = None;
                connection_id.clone()
            })
            .collect()
    }

    async fn detach_room(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        let mut connections = self.connections.lock().await;
        connections
            .iter_mut()
            .filter(|(_, entry)| entry.room_id.as_ref() == Some(room_id))
            .map(|(connection_id, entry)| {
                entry.room_id = None;
                connection_id.clone()
            })
            .collect()
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &RoomEvent,
    ) -> Result<(), MessagePushError> {
        let content = Self::encode(event)?;
        let connections = self.connections.lock().await;

        if let Some(entry) = connections.get(connection_id) {
            entry
                .sender
                .send(content)
                .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
            tracing::debug!("Pushed '{}' to connection '{}'", event.kind(), connection_id);
            Ok(())
        } else {
            Err(MessagePushError::ConnectionNotFound(
                connection_id.to_string(),
            ))
        }
    }

    async fn broadcast(
        &self,
        room_id: &RoomId,
        event: &RoomEvent,
        exclude: Option<&ConnectionId>,
    ) -> Result<usize, MessagePushError> {
        let content = Self::encode(event)?;
        let connections = self.connections.lock().await;

        let mut delivered = 0;
        for (connection_id, entry) in connections.iter() {
            if entry.room_id.as_ref() != Some(room_id) || Some(connection_id) == exclude {
                continue;
            }
            // ブロードキャストでは一部の送信失敗を許容
            match entry.sender.send(content.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!(
                    "Failed to push '{}' to connection '{}': {}",
                    event.kind(),
                    connection_id,
                    e
                ),
            }
        }
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 接続の登録・登録解除と、ルームへの参加状態の管理
    // - push_to: 特定の接続への送信
    // - broadcast: ルームに参加している接続への送信（除外・部分失敗）
    //
    // 【なぜこのテストが必要か】
    // - MessagePusher は UseCase から呼ばれる通信層の中核
    // - 参加状態がずれると、退出・キックされた接続にイベントが届いてしまう
    // ========================================

    fn connection(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    async fn register(
        pusher: &WebSocketMessagePusher,
        connection_id: &str,
        user_id: &str,
    ) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        pusher
            .register_connection(connection(connection_id), user(user_id), tx)
            .await;
        rx
    }

    #[tokio::test]
    async fn test_attach_switches_rooms() {
        // テスト項目: attach は直前に参加していたルームを返し、参加先を置き換える
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let _rx = register(&pusher, "c1", "alice").await;

        // when (操作):
        let first = pusher.attach(&connection("c1"), room("r1")).await;
        let second = pusher.attach(&connection("c1"), room("r2")).await;

        // then (期待する結果):
        assert_eq!(first, Ok(None));
        assert_eq!(second, Ok(Some(room("r1"))));
        assert_eq!(pusher.room_of(&connection("c1")).await, Some(room("r2")));
    }

    #[tokio::test]
    async fn test_attach_unknown_connection() {
        // テスト項目: 登録されていない接続は参加できない
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();

        // when (操作):
        let result = pusher.attach(&connection("ghost"), room("r1")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(MessagePushError::ConnectionNotFound("ghost".to_string()))
        );
    }

    #[tokio::test]
    async fn test_push_to_sends_server_message_json() {
        // テスト項目: push_to はイベントを ServerMessage の JSON にして送る
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let mut rx = register(&pusher, "c1", "alice").await;

        // when (操作):
        pusher
            .push_to(&connection("c1"), &RoomEvent::error("Room not found"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            rx.recv().await.unwrap(),
            r#"{"type":"error","message":"Room not found"}"#
        );
    }

    #[tokio::test]
    async fn test_broadcast_only_reaches_attached_connections() {
        // テスト項目: ブロードキャストは同じルームに参加している接続（除外分を除く）にだけ届く
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let mut alice = register(&pusher, "c1", "alice").await;
        let mut bob = register(&pusher, "c2", "bob").await;
        let mut carol = register(&pusher, "c3", "carol").await;
        let mut dave = register(&pusher, "c4", "dave").await;
        pusher.attach(&connection("c1"), room("r1")).await.unwrap();
        pusher.attach(&connection("c2"), room("r1")).await.unwrap();
        pusher.attach(&connection("c3"), room("r2")).await.unwrap();
        let event = RoomEvent::MemberJoined {
            user_id: user("alice"),
        };

        // when (操作):
        let delivered = pusher
            .broadcast(&room("r1"), &event, Some(&connection("c1")))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert!(bob.recv().await.is_some());
        assert!(alice.try_recv().is_err());
        assert!(carol.try_recv().is_err());
        assert!(dave.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_tolerates_closed_connection() {
        // テスト項目: 受信側が閉じた接続があってもブロードキャストは続行される
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let closed = register(&pusher, "c1", "alice").await;
        let mut open = register(&pusher, "c2", "bob").await;
        pusher.attach(&connection("c1"), room("r1")).await.unwrap();
        pusher.attach(&connection("c2"), room("r1")).await.unwrap();
        drop(closed);

        // when (操作):
        let delivered = pusher
            .broadcast(&room("r1"), &RoomEvent::error("ping"), None)
            .await;

        // then (期待する結果):
        assert_eq!(delivered, Ok(1));
        assert!(open.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_detach_user_and_room() {
        // テスト項目: detach_user は対象ユーザーの接続だけを、detach_room はルームの全接続を外す
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let _a = register(&pusher, "c1", "alice").await;
        let _b1 = register(&pusher, "c2", "bob").await;
        let _b2 = register(&pusher, "c3", "bob").await;
        for id in ["c1", "c2", "c3"] {
            pusher.attach(&connection(id), room("r1")).await.unwrap();
        }

        // when (操作):
        let mut evicted = pusher.detach_user(&room("r1"), &user("bob")).await;
        evicted.sort();

        // then (期待する結果):
        assert_eq!(evicted, vec![connection("c2"), connection("c3")]);
        assert_eq!(pusher.room_of(&connection("c1")).await, Some(room("r1")));

        // when (操作):
        let closed = pusher.detach_room(&room("r1")).await;

        // then (期待する結果):
        assert_eq!(closed, vec![connection("c1")]);
        assert_eq!(pusher.room_of(&connection("c1")).await, None);
        assert_eq!(pusher.connection_count().await, 3);
    }

    #[tokio::test]
    async fn test_unregister_returns_room() {
        // テスト項目: 登録解除すると参加していたルームが返る
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let _rx = register(&pusher, "c1", "alice").await;
        pusher.attach(&connection("c1"), room("r1")).await.unwrap();

        // when (操作):
        let room_id = pusher.unregister_connection(&connection("c1")).await;

        // then (期待する結果):
        assert_eq!(room_id, Some(room("r1")));
        assert_eq!(pusher.connection_count().await, 0);
        assert_eq!(pusher.unregister_connection(&connection("c1")).await, None);
    }

    #[tokio::test]
    async fn test_attached_rooms_and_users() {
        // テスト項目: 参加中のルームとルームごとのユーザーが重複なく列挙される
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let _a = register(&pusher, "c1", "alice").await;
        let _b1 = register(&pusher, "c2", "bob").await;
        let _b2 = register(&pusher, "c3", "bob").await;
        let _c = register(&pusher, "c4", "carol").await;
        let _idle = register(&pusher, "c5", "dave").await;
        pusher.attach(&connection("c1"), room("r1")).await.unwrap();
        pusher.attach(&connection("c2"), room("r1")).await.unwrap();
        pusher.attach(&connection("c3"), room("r1")).await.unwrap();
        pusher.attach(&connection("c4"), room("r2")).await.unwrap();

        // when (操作):
        let rooms = pusher.attached_rooms().await;
        let users = pusher.attached_users(&room("r1")).await;

        // then (期待する結果):
        assert_eq!(rooms, vec![room("r1"), room("r2")]);
        assert_eq!(users, vec![user("alice"), user("bob")]);
        assert!(pusher.attached_users(&room("r3")).await.is_empty());
    }
}
