//! WebSocket connection handlers.
//!
//! コネクションごとのライフサイクル:
//! 1. upgrade 時にルーム名を検証し、attach でプレースホルダ登録
//! 2. 最初のテキストフレーム（join）を待つ（タイムアウトあり）
//! 3. admit 後は受信ループで各 UseCase にディスパッチ
//! 4. どんな終わり方でも最後に必ず disconnect の後片付けを通す

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitStream, StreamExt},
};
use tokio::sync::mpsc;

use crate::{
    domain::{ParticipantId, RoomName, SharedRoom},
    infrastructure::dto::websocket::{ClientMessage, ServerMessage, SignalKind},
    ui::state::AppState,
};

/// How long a connection may sit attached without completing its join handshake
const JOIN_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> RoomName (Domain Model)
    let room_name = match RoomName::new(room) {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!("Rejected WebSocket upgrade: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, room_name)))
}

/// Spawns a task that receives messages from the rx channel and pushes them to
/// the WebSocket sender.
///
/// This is the only place that writes to the socket; usecases enqueue into the
/// channel and never block on network I/O.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            // Send the message to this client
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

/// Outcome of waiting for the first text frame
enum Handshake {
    Join(Option<String>),
    Invalid,
    Closed,
}

/// Wait for the first text frame, skipping control frames
async fn first_frame(receiver: &mut SplitStream<WebSocket>) -> Handshake {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                return match ClientMessage::from_json(&text) {
                    Ok(ClientMessage::Join { display_name }) => Handshake::Join(display_name),
                    _ => Handshake::Invalid,
                };
            }
            Ok(Message::Close(_)) => return Handshake::Closed,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("WebSocket error during handshake: {}", e);
                return Handshake::Closed;
            }
        }
    }
    Handshake::Closed
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, room_name: RoomName) {
    let (sender, mut receiver) = socket.split();

    // Channel for outbound messages to this client
    let (tx, rx) = mpsc::unbounded_channel();
    // Kept for handshake errors raised before any usecase owns the connection
    let error_tx = tx.clone();

    // Attach: placeholder registration + pusher channel registration
    let (room, id) = state.admit_participant_usecase.attach(&room_name, tx).await;
    tracing::info!("Connection '{}' attached to room '{}'", id, room_name);

    let mut send_task = pusher_loop(rx, sender);

    // Join handshake: the first text frame must be a join, within the window
    let display_name = match tokio::time::timeout(JOIN_TIMEOUT, first_frame(&mut receiver)).await {
        Ok(Handshake::Join(display_name)) => display_name,
        Ok(Handshake::Invalid) => {
            tracing::warn!("Connection '{}' sent a non-join first message", id);
            let error = ServerMessage::Error {
                message: "expected a join message".to_string(),
            };
            let _ = error_tx.send(error.to_json());
            drop(error_tx);
            state
                .disconnect_participant_usecase
                .execute(&room, &room_name, &id)
                .await;
            // unregister closed the channel; let the pusher flush and exit
            let _ = send_task.await;
            return;
        }
        Ok(Handshake::Closed) | Err(_) => {
            tracing::info!("Connection '{}' closed or timed out before joining", id);
            drop(error_tx);
            state
                .disconnect_participant_usecase
                .execute(&room, &room_name, &id)
                .await;
            let _ = send_task.await;
            return;
        }
    };
    drop(error_tx);

    match state
        .admit_participant_usecase
        .admit(&room, &id, display_name.as_deref())
        .await
    {
        Ok(outcome) => {
            tracing::info!(
                "Client '{}' joined room '{}' as {:?}",
                id,
                room_name,
                outcome
            );
        }
        Err(e) => {
            // The usecase already pushed the refusal to the client
            tracing::info!("Client '{}' refused from room '{}': {}", id, room_name, e);
            state
                .disconnect_participant_usecase
                .execute(&room, &room_name, &id)
                .await;
            let _ = send_task.await;
            return;
        }
    }

    // Spawn a task to receive messages from this client
    let state_clone = state.clone();
    let room_clone = room.clone();
    let id_clone = id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error for '{}': {}", id_clone, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    // Malformed or unknown frames are dropped without closing
                    // the connection
                    let parsed = match ClientMessage::from_json(&text) {
                        Ok(parsed) => parsed,
                        Err(e) => {
                            tracing::debug!("Dropping malformed frame from '{}': {}", id_clone, e);
                            continue;
                        }
                    };
                    dispatch(&state_clone, &room_clone, &id_clone, parsed).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", id_clone);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Runs exactly once per connection, whatever the close reason
    state
        .disconnect_participant_usecase
        .execute(&room, &room_name, &id)
        .await;
    tracing::info!("Client '{}' disconnected from room '{}'", id, room_name);
}

/// Route one steady-state message to its usecase.
///
/// Protocol-level refusals are pushed back to the client by the usecases
/// themselves; here they are only logged.
async fn dispatch(state: &AppState, room: &SharedRoom, id: &ParticipantId, message: ClientMessage) {
    match message {
        ClientMessage::Join { .. } => {
            tracing::debug!("Duplicate join from '{}' ignored", id);
        }
        ClientMessage::Chat { text } => {
            if let Err(e) = state.send_chat_usecase.execute(room, id, &text).await {
                tracing::debug!("Chat from '{}' refused: {}", id, e);
            }
        }
        ClientMessage::Rename { display_name } => {
            if let Err(e) = state
                .rename_participant_usecase
                .execute(room, id, &display_name)
                .await
            {
                tracing::debug!("Rename from '{}' refused: {}", id, e);
            }
        }
        ClientMessage::Offer(payload) => {
            if let Err(e) = state
                .relay_signal_usecase
                .execute(room, id, SignalKind::Offer, payload)
                .await
            {
                tracing::debug!("Offer from '{}' not relayed: {}", id, e);
            }
        }
        ClientMessage::Answer(payload) => {
            if let Err(e) = state
                .relay_signal_usecase
                .execute(room, id, SignalKind::Answer, payload)
                .await
            {
                tracing::debug!("Answer from '{}' not relayed: {}", id, e);
            }
        }
        ClientMessage::IceCandidate(payload) => {
            if let Err(e) = state
                .relay_signal_usecase
                .execute(room, id, SignalKind::IceCandidate, payload)
                .await
            {
                tracing::debug!("ICE candidate from '{}' not relayed: {}", id, e);
            }
        }
        ClientMessage::Action {
            action,
            target,
            value,
        } => {
            if let Err(e) = state
                .moderate_room_usecase
                .execute(room, id, action, target, value)
                .await
            {
                tracing::debug!("Action from '{}' refused: {}", id, e);
            }
        }
    }
}
