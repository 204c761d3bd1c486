//! End-to-end tests: a real server on an ephemeral port, driven over HTTP and WebSocket.

use std::{sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use matinee_server::{
    app::build_server,
    config::ServerConfig,
    infrastructure::{
        auth::{HmacTokenVerifier, TokenClaims},
        dto::{
            http::{ErrorDto, RoomDto},
            websocket::{ClientMessage, ServerMessage},
        },
    },
};
use matinee_shared::time::SystemClock;
use reqwest::StatusCode;
use tokio::{net::TcpStream, sync::oneshot};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const SECRET: &str = "integration-secret";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Server running in the test process; shut down on drop
struct TestServer {
    addr: std::net::SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start() -> Self {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            token_secret: SECRET.to_string(),
            store_timeout_ms: 2_000,
            clock_ttl_secs: 60,
            content: vec![],
        };
        let server = build_server(&config, Arc::new(SystemClock)).expect("valid config");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            server
                .serve(listener, async {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });
        Self {
            addr,
            shutdown: Some(tx),
        }
    }

    fn http(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn ws(&self, token: &str) -> String {
        format!("ws://{}/ws?token={}", self.addr, token)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn token_for(user: &str) -> String {
    HmacTokenVerifier::new(SECRET, Arc::new(SystemClock))
        .sign(&TokenClaims {
            sub: user.to_string(),
            role: "member".to_string(),
            exp: None,
        })
        .unwrap()
}

async fn send(socket: &mut Socket, message: &ClientMessage) {
    let json = serde_json::to_string(message).unwrap();
    socket.send(Message::text(json)).await.unwrap();
}

/// Next server event, skipping control frames
async fn next_event(socket: &mut Socket) -> ServerMessage {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("timed out waiting for a server event")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn assert_silent(socket: &mut Socket) {
    let result = tokio::time::timeout(Duration::from_millis(200), socket.next()).await;
    assert!(result.is_err(), "unexpected frame: {:?}", result);
}

async fn create_room(server: &TestServer, owner: &str, max_members: usize) -> RoomDto {
    let response = reqwest::Client::new()
        .post(server.http("/rooms"))
        .bearer_auth(token_for(owner))
        .json(&serde_json::json!({"contentId": "movie-1", "maxMembers": max_members}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn join_by_invite(server: &TestServer, user: &str, invite_code: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(server.http(&format!("/rooms/join/{}", invite_code)))
        .bearer_auth(token_for(user))
        .send()
        .await
        .unwrap()
}

async fn open_session(server: &TestServer, user: &str, room_id: &str) -> Socket {
    let (mut socket, _) = connect_async(server.ws(&token_for(user))).await.unwrap();
    send(
        &mut socket,
        &ClientMessage::Join {
            room_id: room_id.to_string(),
        },
    )
    .await;
    match next_event(&mut socket).await {
        ServerMessage::Joined { room, .. } => assert_eq!(room.id, room_id),
        other => panic!("expected joined, got {:?}", other),
    }
    socket
}

#[tokio::test]
async fn test_watch_party_lifecycle() {
    // テスト項目: ルーム作成から参加・再生同期・オーナー退出によるルーム終了まで一連の流れが動く
    // given (前提条件):
    let server = TestServer::start().await;
    let room = create_room(&server, "m1", 2).await;
    assert_eq!(room.owner_id, "m1");
    assert_eq!(room.status, "waiting");

    let joined = join_by_invite(&server, "m2", &room.invite_code).await;
    assert_eq!(joined.status(), StatusCode::OK);
    let joined: RoomDto = joined.json().await.unwrap();
    assert_eq!(joined.members, vec!["m1".to_string(), "m2".to_string()]);

    let full = join_by_invite(&server, "m3", &room.invite_code).await;
    assert_eq!(full.status(), StatusCode::BAD_REQUEST);

    let mut owner = open_session(&server, "m1", &room.id).await;
    let mut member = open_session(&server, "m2", &room.id).await;
    assert_eq!(
        next_event(&mut owner).await,
        ServerMessage::MemberJoined {
            user_id: "m2".to_string()
        }
    );

    // when (操作):
    send(&mut owner, &ClientMessage::Play { offset: 0.0 }).await;

    // then (期待する結果):
    for socket in [&mut owner, &mut member] {
        match next_event(socket).await {
            ServerMessage::VideoPlay(clock) => {
                assert!(clock.playing);
                assert_eq!(clock.offset, 0.0);
                assert_eq!(clock.updated_by, "m1");
            }
            other => panic!("expected video_play, got {:?}", other),
        }
    }

    // when (操作): メンバーの再生操作は無視され、チャットは全員に届く
    send(&mut member, &ClientMessage::Pause { offset: 3.0 }).await;
    send(
        &mut member,
        &ClientMessage::Message {
            text: "hello".to_string(),
        },
    )
    .await;

    // then (期待する結果):
    for socket in [&mut owner, &mut member] {
        match next_event(socket).await {
            ServerMessage::RoomMessage { user_id, text, .. } => {
                assert_eq!(user_id, "m2");
                assert_eq!(text, "hello");
            }
            other => panic!("expected room_message, got {:?}", other),
        }
    }

    // when (操作): オーナーが切断する
    owner.close(None).await.unwrap();

    // then (期待する結果):
    assert_eq!(
        next_event(&mut member).await,
        ServerMessage::MemberLeft {
            user_id: "m1".to_string()
        }
    );
    assert_eq!(
        next_event(&mut member).await,
        ServerMessage::RoomEnded {
            room_id: room.id.clone()
        }
    );
    assert_silent(&mut member).await;

    let late = join_by_invite(&server, "m4", &room.invite_code).await;
    assert_eq!(late.status(), StatusCode::NOT_FOUND);
    let body: ErrorDto = late.json().await.unwrap();
    assert_eq!(body.error, "not_found");
}

#[tokio::test]
async fn test_requests_without_valid_token_are_rejected() {
    // テスト項目: 資格情報が無い・不正な HTTP リクエストと WebSocket 接続は 401 で拒否される
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // when (操作):
    let missing = client.get(server.http("/rooms")).send().await.unwrap();
    let forged = client
        .get(server.http("/rooms"))
        .bearer_auth("bm90LWEtdG9rZW4.c2ln")
        .send()
        .await
        .unwrap();
    let socket = connect_async(server.ws("garbage")).await;

    // then (期待する結果):
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
    match socket {
        Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
            assert_eq!(response.status().as_u16(), 401);
        }
        other => panic!("expected 401 handshake failure, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_leave_is_idempotent_and_health_is_public() {
    // テスト項目: 退出は何度呼んでも 200 を返し、ヘルスチェックは認証不要
    // given (前提条件):
    let server = TestServer::start().await;
    let room = create_room(&server, "m1", 4).await;
    let client = reqwest::Client::new();

    // when (操作):
    let not_member = client
        .delete(server.http(&format!("/rooms/{}/leave", room.id)))
        .bearer_auth(token_for("stranger"))
        .send()
        .await
        .unwrap();
    let unknown_room = client
        .delete(server.http("/rooms/does-not-exist/leave"))
        .bearer_auth(token_for("m1"))
        .send()
        .await
        .unwrap();
    let health = client.get(server.http("/health")).send().await.unwrap();

    // then (期待する結果):
    assert_eq!(not_member.status(), StatusCode::OK);
    assert_eq!(unknown_room.status(), StatusCode::OK);
    assert_eq!(health.status(), StatusCode::OK);

    let rooms: Vec<RoomDto> = client
        .get(server.http("/rooms"))
        .bearer_auth(token_for("m2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].id, room.id);
}

#[tokio::test]
async fn test_malformed_frame_yields_error_event() {
    // テスト項目: 解釈できないフレームには error イベントが返り、接続は維持される
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut socket, _) = connect_async(server.ws(&token_for("m1"))).await.unwrap();

    // when (操作):
    socket.send(Message::text("{not json")).await.unwrap();
    send(
        &mut socket,
        &ClientMessage::Join {
            room_id: "missing-room".to_string(),
        },
    )
    .await;

    // then (期待する結果):
    assert!(matches!(
        next_event(&mut socket).await,
        ServerMessage::Error { .. }
    ));
    match next_event(&mut socket).await {
        ServerMessage::Error { message } => assert_eq!(message, "Room not found"),
        other => panic!("expected error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_member_reconnects_and_rejoins_with_current_clock() {
    // テスト項目: メンバーの接続が切れても再接続して join し直せ、最新のクロックを受け取れる
    // given (前提条件):
    let server = TestServer::start().await;
    let room = create_room(&server, "m1", 2).await;
    let joined = join_by_invite(&server, "m2", &room.invite_code).await;
    assert_eq!(joined.status(), StatusCode::OK);
    let mut owner = open_session(&server, "m1", &room.id).await;
    let member = open_session(&server, "m2", &room.id).await;
    assert_eq!(
        next_event(&mut owner).await,
        ServerMessage::MemberJoined {
            user_id: "m2".to_string()
        }
    );
    send(&mut owner, &ClientMessage::Seek { offset: 42.0 }).await;
    assert!(matches!(
        next_event(&mut owner).await,
        ServerMessage::VideoSeek(_)
    ));
    send(&mut owner, &ClientMessage::Play { offset: 42.0 }).await;
    assert!(matches!(
        next_event(&mut owner).await,
        ServerMessage::VideoPlay(_)
    ));

    // when (操作): メンバーの接続が切れる
    drop(member);

    // then (期待する結果): 他のメンバーには member_left が届くが、ルームは続く
    assert_eq!(
        next_event(&mut owner).await,
        ServerMessage::MemberLeft {
            user_id: "m2".to_string()
        }
    );

    // when (操作): 再接続して同じルームに join し直す
    let (mut member, _) = connect_async(server.ws(&token_for("m2"))).await.unwrap();
    send(
        &mut member,
        &ClientMessage::Join {
            room_id: room.id.clone(),
        },
    )
    .await;

    // then (期待する結果):
    match next_event(&mut member).await {
        ServerMessage::Joined { room: joined, clock } => {
            assert_eq!(joined.id, room.id);
            assert!(joined.members.contains(&"m2".to_string()));
            assert!(clock.playing);
            assert_eq!(clock.offset, 42.0);
            assert_eq!(clock.updated_by, "m1");
        }
        other => panic!("expected joined, got {:?}", other),
    }
    assert_eq!(
        next_event(&mut owner).await,
        ServerMessage::MemberJoined {
            user_id: "m2".to_string()
        }
    );
}

#[tokio::test]
async fn test_kicked_member_stays_connected_but_leaves_channel() {
    // テスト項目: キックされたメンバーには member_kicked が届き、接続は残るがルームのイベントは届かなくなる
    // given (前提条件):
    let server = TestServer::start().await;
    let room = create_room(&server, "m1", 3).await;
    let joined = join_by_invite(&server, "m2", &room.invite_code).await;
    assert_eq!(joined.status(), StatusCode::OK);
    let mut owner = open_session(&server, "m1", &room.id).await;
    let mut member = open_session(&server, "m2", &room.id).await;
    assert_eq!(
        next_event(&mut owner).await,
        ServerMessage::MemberJoined {
            user_id: "m2".to_string()
        }
    );

    // when (操作):
    send(
        &mut owner,
        &ClientMessage::Kick {
            target_user_id: "m2".to_string(),
        },
    )
    .await;

    // then (期待する結果): 本人を含めて通知される
    for socket in [&mut owner, &mut member] {
        assert_eq!(
            next_event(socket).await,
            ServerMessage::MemberKicked {
                user_id: "m2".to_string()
            }
        );
    }

    // when (操作): キック後にルームでチャットと再生操作が行われる
    send(
        &mut owner,
        &ClientMessage::Message {
            text: "still here".to_string(),
        },
    )
    .await;
    send(&mut owner, &ClientMessage::Play { offset: 1.0 }).await;

    // then (期待する結果): オーナーには届き、キックされた接続には届かない
    assert!(matches!(
        next_event(&mut owner).await,
        ServerMessage::RoomMessage { .. }
    ));
    assert!(matches!(
        next_event(&mut owner).await,
        ServerMessage::VideoPlay(_)
    ));
    assert_silent(&mut member).await;

    // then (期待する結果): 接続は開いたままで、メンバーではないため join し直せない
    send(
        &mut member,
        &ClientMessage::Join {
            room_id: room.id.clone(),
        },
    )
    .await;
    match next_event(&mut member).await {
        ServerMessage::Error { message } => assert!(message.contains("not a member")),
        other => panic!("expected error, got {:?}", other),
    }
}
