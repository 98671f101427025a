//! Integration tests driving the signaling server over real WebSocket
//! connections against an in-process instance on an ephemeral port.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};

use hiroma::{
    infrastructure::{directory::InMemoryRoomDirectory, message_pusher::WebSocketMessagePusher},
    ui::Server,
    usecase::{
        AdmitParticipantUseCase, DisconnectParticipantUseCase, GetRoomStateUseCase,
        ModerateRoomUseCase, RelaySignalUseCase, RenameParticipantUseCase, SendChatUseCase,
    },
};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Start the full production router on 127.0.0.1:0 and return its address
async fn spawn_server() -> String {
    let directory = Arc::new(InMemoryRoomDirectory::new());
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    let server = Server::new(
        Arc::new(AdmitParticipantUseCase::new(
            directory.clone(),
            message_pusher.clone(),
        )),
        Arc::new(DisconnectParticipantUseCase::new(
            directory.clone(),
            message_pusher.clone(),
        )),
        Arc::new(SendChatUseCase::new(message_pusher.clone())),
        Arc::new(RelaySignalUseCase::new(message_pusher.clone())),
        Arc::new(RenameParticipantUseCase::new(message_pusher.clone())),
        Arc::new(ModerateRoomUseCase::new(message_pusher.clone())),
        Arc::new(GetRoomStateUseCase::new(directory.clone())),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to get local addr");
    tokio::spawn(async move {
        axum::serve(listener, server.router())
            .await
            .expect("Test server crashed");
    });

    format!("127.0.0.1:{}", addr.port())
}

/// One WebSocket client connected to the test server
struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Open a WebSocket connection to the given room (no join yet)
    async fn connect(addr: &str, room: &str) -> Self {
        let url = format!("ws://{}/ws/{}", addr, room);
        let (ws, _) = connect_async(&url)
            .await
            .expect("Failed to connect WebSocket");
        Self { ws }
    }

    async fn send(&mut self, message: Value) {
        self.ws
            .send(Message::Text(message.to_string().into()))
            .await
            .expect("Failed to send message");
    }

    /// Receive the next text frame as JSON, skipping control frames
    async fn recv(&mut self) -> Value {
        loop {
            let msg = tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .expect("Timed out waiting for a message")
                .expect("Connection closed while waiting for a message")
                .expect("WebSocket error while waiting for a message");
            if let Message::Text(text) = msg {
                return serde_json::from_str(&text).expect("Server sent invalid JSON");
            }
        }
    }

    /// Receive frames until one with the given `type` arrives
    async fn recv_type(&mut self, message_type: &str) -> Value {
        loop {
            let msg = self.recv().await;
            if msg["type"] == message_type {
                return msg;
            }
        }
    }

    /// Connect and complete the join handshake; returns (client, own id, welcome)
    async fn join(addr: &str, room: &str, name: &str) -> (Self, String, Value) {
        let mut client = Self::connect(addr, room).await;
        client.send(json!({"type": "join", "displayName": name})).await;
        let welcome = client.recv_type("welcome").await;
        let id = welcome["id"].as_str().expect("welcome without id").to_string();
        (client, id, welcome)
    }

    /// Assert that the server closes this connection
    async fn expect_closed(&mut self) {
        loop {
            match tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .expect("Timed out waiting for the connection to close")
            {
                None | Some(Ok(Message::Close(_))) | Some(Err(_)) => return,
                Some(Ok(_)) => {}
            }
        }
    }
}

#[tokio::test]
async fn test_first_joiner_becomes_host() {
    // テスト項目: 空ルームへの初回 join でホストに選出される
    // given (前提条件):
    let addr = spawn_server().await;

    // when (操作):
    let (_alice, alice_id, welcome) = TestClient::join(&addr, "lobby", "Alice").await;

    // then (期待する結果):
    assert_eq!(welcome["host_id"], alice_id);
    assert_eq!(welcome["participants"].as_array().unwrap().len(), 1);
    assert_eq!(welcome["participants"][0]["name"], "Alice");
    assert_eq!(welcome["room"]["require_approval"], false);
    assert_eq!(welcome["room"]["locked"], false);
}

#[tokio::test]
async fn test_open_room_join_is_announced_to_existing_participants() {
    // テスト項目: 承認不要ルームへの後続 join が既存参加者に通知される
    // given (前提条件):
    let addr = spawn_server().await;
    let (mut alice, alice_id, _) = TestClient::join(&addr, "lobby", "Alice").await;

    // when (操作):
    let (_bob, bob_id, bob_welcome) = TestClient::join(&addr, "lobby", "Bob").await;

    // then (期待する結果): bob の welcome は 2 人のロスターとホスト ID を含む
    assert_eq!(bob_welcome["host_id"], alice_id);
    assert_eq!(bob_welcome["participants"].as_array().unwrap().len(), 2);

    // alice には participant-joined → participants-update が届く
    let joined = alice.recv_type("participant-joined").await;
    assert_eq!(joined["id"], bob_id);
    assert_eq!(joined["name"], "Bob");
    let roster = alice.recv_type("participants-update").await;
    assert_eq!(roster["participants"].as_array().unwrap().len(), 2);
    assert_eq!(roster["host_id"], alice_id);
}

#[tokio::test]
async fn test_offer_is_relayed_to_target_with_stamped_from() {
    // テスト項目: offer がターゲットにのみ転送され、from が刻印される
    // given (前提条件):
    let addr = spawn_server().await;
    let (mut alice, alice_id, _) = TestClient::join(&addr, "lobby", "Alice").await;
    let (mut bob, bob_id, _) = TestClient::join(&addr, "lobby", "Bob").await;

    // when (操作): bob が from を詐称した offer を送る
    bob.send(json!({
        "type": "offer",
        "to": alice_id,
        "from": "spoofed",
        "sdp": "v=0 fake-sdp"
    }))
    .await;

    // then (期待する結果): alice に届き、from は bob の実 ID
    let offer = alice.recv_type("offer").await;
    assert_eq!(offer["from"], bob_id);
    assert_eq!(offer["sdp"], "v=0 fake-sdp");
}

#[tokio::test]
async fn test_chat_is_broadcast_to_other_participants() {
    // テスト項目: チャットが送信者以外の承認済み参加者に届く
    // given (前提条件):
    let addr = spawn_server().await;
    let (mut alice, _, _) = TestClient::join(&addr, "lobby", "Alice").await;
    let (mut bob, bob_id, _) = TestClient::join(&addr, "lobby", "Bob").await;

    // when (操作):
    bob.send(json!({"type": "chat", "text": "hello"})).await;

    // then (期待する結果):
    let chat = alice.recv_type("chat").await;
    assert_eq!(chat["from"], bob_id);
    assert_eq!(chat["name"], "Bob");
    assert_eq!(chat["text"], "hello");
    // 送信者自身には戻らない（次の独立メッセージで確認する）
    alice.send(json!({"type": "chat", "text": "hi"})).await;
    let next = bob.recv_type("chat").await;
    assert_eq!(next["text"], "hi");
}

#[tokio::test]
async fn test_approval_flow_accept() {
    // テスト項目: 承認制ルームで join → join-request → accept → welcome の一連の流れ
    // given (前提条件):
    let addr = spawn_server().await;
    let (mut alice, _, _) = TestClient::join(&addr, "studio", "Alice").await;
    alice
        .send(json!({"type": "action", "action": "set-approval", "value": true}))
        .await;
    let meta = alice.recv_type("room-meta").await;
    assert_eq!(meta["meta"]["require_approval"], true);

    // when (操作): bob が join する
    let mut bob = TestClient::connect(&addr, "studio").await;
    bob.send(json!({"type": "join", "displayName": "Bob"})).await;

    // then (期待する結果): bob は waiting、alice には join-request が届く
    let waiting = bob.recv_type("waiting").await;
    assert!(waiting["message"].as_str().is_some());
    let request = alice.recv_type("join-request").await;
    let bob_id = request["participant"]["id"].as_str().unwrap().to_string();
    assert_eq!(request["participant"]["name"], "Bob");

    // alice が accept すると bob に welcome が届く
    alice
        .send(json!({"type": "action", "action": "accept", "target": bob_id}))
        .await;
    let welcome = bob.recv_type("welcome").await;
    assert_eq!(welcome["id"], bob_id);
    assert_eq!(welcome["participants"].as_array().unwrap().len(), 2);

    // 既存参加者には need-offer が届き、ネゴシエーション開始を促される
    let need_offer = alice.recv_type("need-offer").await;
    assert_eq!(need_offer["target"], bob_id);
}

#[tokio::test]
async fn test_approval_flow_reject_closes_connection() {
    // テスト項目: reject された保留中参加者が通知を受けて切断される
    // given (前提条件):
    let addr = spawn_server().await;
    let (mut alice, _, _) = TestClient::join(&addr, "studio", "Alice").await;
    alice
        .send(json!({"type": "action", "action": "set-approval", "value": true}))
        .await;
    alice.recv_type("room-meta").await;

    let mut bob = TestClient::connect(&addr, "studio").await;
    bob.send(json!({"type": "join", "displayName": "Bob"})).await;
    bob.recv_type("waiting").await;
    let request = alice.recv_type("join-request").await;
    let bob_id = request["participant"]["id"].as_str().unwrap().to_string();
    // join-request 直後に配られる pending=[Bob] を先に消化しておく
    let pending = alice.recv_type("pending").await;
    assert_eq!(pending["pending"].as_array().unwrap().len(), 1);

    // when (操作):
    alice
        .send(json!({"type": "action", "action": "reject", "target": bob_id}))
        .await;

    // then (期待する結果): bob に you-are-rejected が届き、接続が閉じる
    let command = bob.recv_type("command").await;
    assert_eq!(command["cmd"], "you-are-rejected");
    bob.expect_closed().await;

    // alice の pending リストは空になる
    let pending = alice.recv_type("pending").await;
    assert_eq!(pending["pending"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_pending_participant_cannot_chat() {
    // テスト項目: 保留中の参加者はチャットを拒否され、接続は維持される
    // given (前提条件):
    let addr = spawn_server().await;
    let (mut alice, _, _) = TestClient::join(&addr, "studio", "Alice").await;
    alice
        .send(json!({"type": "action", "action": "set-approval", "value": true}))
        .await;
    alice.recv_type("room-meta").await;

    let mut bob = TestClient::connect(&addr, "studio").await;
    bob.send(json!({"type": "join", "displayName": "Bob"})).await;
    bob.recv_type("waiting").await;
    let request = alice.recv_type("join-request").await;
    let bob_id = request["participant"]["id"].as_str().unwrap().to_string();

    // when (操作): 保留中の bob がチャットを試みる
    bob.send(json!({"type": "chat", "text": "let me in"})).await;

    // then (期待する結果): bob にエラーが返り、接続は閉じない
    let error = bob.recv_type("error").await;
    assert!(error["message"].as_str().unwrap().contains("not approved"));

    // accept 後は普通にチャットできる
    alice
        .send(json!({"type": "action", "action": "accept", "target": bob_id}))
        .await;
    bob.recv_type("welcome").await;
    bob.send(json!({"type": "chat", "text": "thanks"})).await;
    let chat = alice.recv_type("chat").await;
    assert_eq!(chat["text"], "thanks");
}

#[tokio::test]
async fn test_kick_closes_target_and_announces_departure() {
    // テスト項目: kick されたクライアントが切断され、退出が通知される
    // given (前提条件):
    let addr = spawn_server().await;
    let (mut alice, _, _) = TestClient::join(&addr, "lobby", "Alice").await;
    let (mut bob, bob_id, _) = TestClient::join(&addr, "lobby", "Bob").await;

    // when (操作):
    alice
        .send(json!({"type": "action", "action": "kick", "target": bob_id}))
        .await;

    // then (期待する結果): bob に you-are-kicked が届き、接続が閉じる
    let command = bob.recv_type("command").await;
    assert_eq!(command["cmd"], "you-are-kicked");
    bob.expect_closed().await;

    // alice には participant-left と更新済みロスターが届く
    let left = alice.recv_type("participant-left").await;
    assert_eq!(left["id"], bob_id);
    let roster = alice.recv_type("participants-update").await;
    assert_eq!(roster["participants"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_host_succession_on_host_disconnect() {
    // テスト項目: ホスト切断で挿入順最古の承認済み参加者がホストを継承する
    // given (前提条件):
    let addr = spawn_server().await;
    let (alice, _, _) = TestClient::join(&addr, "lobby", "Alice").await;
    let (mut bob, bob_id, _) = TestClient::join(&addr, "lobby", "Bob").await;

    // when (操作): alice が切断する
    drop(alice);

    // then (期待する結果): bob が participant-left と新ホストのロスターを受け取る
    bob.recv_type("participant-left").await;
    let roster = bob.recv_type("participants-update").await;
    assert_eq!(roster["host_id"], bob_id);
}

#[tokio::test]
async fn test_locked_room_refuses_new_joins() {
    // テスト項目: ロック済みルームへの join がエラーで拒否され切断される
    // given (前提条件):
    let addr = spawn_server().await;
    let (mut alice, _, _) = TestClient::join(&addr, "lobby", "Alice").await;
    alice
        .send(json!({"type": "action", "action": "lock-room"}))
        .await;
    let lock = alice.recv_type("room-lock").await;
    assert_eq!(lock["locked"], true);

    // when (操作):
    let mut carol = TestClient::connect(&addr, "lobby").await;
    carol.send(json!({"type": "join", "displayName": "Carol"})).await;

    // then (期待する結果):
    let error = carol.recv_type("error").await;
    assert_eq!(error["message"], "room is locked");
    carol.expect_closed().await;

    // unlock 後は join できる
    alice
        .send(json!({"type": "action", "action": "unlock-room"}))
        .await;
    alice.recv_type("room-lock").await;
    let (_dave, _, welcome) = TestClient::join(&addr, "lobby", "Dave").await;
    assert_eq!(welcome["participants"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_make_host_transfers_privileges() {
    // テスト項目: make-host でモデレーション権限が移る
    // given (前提条件):
    let addr = spawn_server().await;
    let (mut alice, _, _) = TestClient::join(&addr, "lobby", "Alice").await;
    let (mut bob, bob_id, _) = TestClient::join(&addr, "lobby", "Bob").await;
    // join 直後のロスター（host は alice）を先に消化しておく
    bob.recv_type("participants-update").await;

    // when (操作):
    alice
        .send(json!({"type": "action", "action": "make-host", "target": bob_id}))
        .await;

    // then (期待する結果): ロスターの host_id が bob になる
    let roster = bob.recv_type("participants-update").await;
    assert_eq!(roster["host_id"], bob_id);

    // 旧ホストのモデレーションは拒否される
    alice
        .send(json!({"type": "action", "action": "lock-room"}))
        .await;
    let error = alice.recv_type("error").await;
    assert!(error["message"].as_str().unwrap().contains("host"));

    // 新ホストはロックできる
    bob.send(json!({"type": "action", "action": "lock-room"})).await;
    let lock = bob.recv_type("room-lock").await;
    assert_eq!(lock["locked"], true);
}

#[tokio::test]
async fn test_non_join_first_message_is_refused() {
    // テスト項目: 最初のメッセージが join でない接続は拒否される
    // given (前提条件):
    let addr = spawn_server().await;
    let mut client = TestClient::connect(&addr, "lobby").await;

    // when (操作):
    client.send(json!({"type": "chat", "text": "hi"})).await;

    // then (期待する結果):
    let error = client.recv_type("error").await;
    assert!(error["message"].as_str().unwrap().contains("join"));
    client.expect_closed().await;
}

#[tokio::test]
async fn test_malformed_frames_are_dropped_without_closing() {
    // テスト項目: join 後の不正なフレームは無視され、接続は維持される
    // given (前提条件):
    let addr = spawn_server().await;
    let (mut alice, _, _) = TestClient::join(&addr, "lobby", "Alice").await;
    let (mut bob, _, _) = TestClient::join(&addr, "lobby", "Bob").await;
    alice.recv_type("participants-update").await;

    // when (操作): 不正な JSON と未知の type を送る
    bob.send(json!({"type": "teleport", "to": "nowhere"})).await;
    bob.ws
        .send(Message::Text("not json at all".to_string().into()))
        .await
        .expect("Failed to send raw frame");

    // then (期待する結果): その後のチャットが普通に通る
    bob.send(json!({"type": "chat", "text": "still here"})).await;
    let chat = alice.recv_type("chat").await;
    assert_eq!(chat["text"], "still here");
}

#[tokio::test]
async fn test_rename_updates_roster_for_everyone() {
    // テスト項目: rename が全員のロスターに反映される
    // given (前提条件):
    let addr = spawn_server().await;
    let (mut alice, _, _) = TestClient::join(&addr, "lobby", "Alice").await;
    let (mut bob, bob_id, _) = TestClient::join(&addr, "lobby", "Bob").await;
    // bob の join が反映されたロスターまで読み進めておく
    loop {
        let roster = alice.recv_type("participants-update").await;
        if roster["participants"].as_array().unwrap().len() == 2 {
            break;
        }
    }

    // when (操作):
    bob.send(json!({"type": "rename", "displayName": "Robert"})).await;

    // then (期待する結果):
    let roster = alice.recv_type("participants-update").await;
    let renamed = roster["participants"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == bob_id.as_str())
        .expect("bob missing from roster");
    assert_eq!(renamed["name"], "Robert");
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    // テスト項目: 別ルームの参加者には何も届かない
    // given (前提条件):
    let addr = spawn_server().await;
    let (mut alice, _, _) = TestClient::join(&addr, "room-a", "Alice").await;
    let (mut bob, _, bob_welcome) = TestClient::join(&addr, "room-b", "Bob").await;

    // then (期待する結果): 両者とも自室のホストになる
    assert_eq!(bob_welcome["participants"].as_array().unwrap().len(), 1);

    // when (操作): alice がチャットを送っても bob には届かない
    alice.send(json!({"type": "chat", "text": "a-only"})).await;
    bob.send(json!({"type": "chat", "text": "b-only"})).await;
    // bob が次に受け取るのは自室のメッセージだけ（何も来ないはずなので
    // 新しい参加者で到達性を確認する）
    let (_carol, carol_id, _) = TestClient::join(&addr, "room-b", "Carol").await;
    let joined = bob.recv_type("participant-joined").await;
    assert_eq!(joined["id"], carol_id);
}
