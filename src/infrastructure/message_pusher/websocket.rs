//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続中クライアントの `UnboundedSender` を管理
//! - クライアントへのメッセージ送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`src/ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に
//! 使用します。ParticipantId は UUID v4 なので、マップはルームを跨いで
//! ひとつで足ります。
//!
//! `unregister_client` は sender を drop することでクライアントの pusher
//! タスクを終了させ、結果として WebSocket を閉じます。reject / kick の
//! 強制切断もこの経路を使います。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{MessagePushError, MessagePusher, ParticipantId, PusherChannel};

/// WebSocket-backed MessagePusher implementation
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの WebSocket sender
    ///
    /// Key: ParticipantId
    /// Value: PusherChannel
    clients: Mutex<HashMap<ParticipantId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, id: ParticipantId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Client '{}' registered to MessagePusher", id);
        clients.insert(id, sender);
    }

    async fn unregister_client(&self, id: &ParticipantId) {
        let mut clients = self.clients.lock().await;
        clients.remove(id);
        tracing::debug!("Client '{}' unregistered from MessagePusher", id);
    }

    async fn push_to(&self, id: &ParticipantId, content: &str) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;

        if let Some(sender) = clients.get(id) {
            sender
                .send(content.to_string())
                .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
            tracing::debug!("Pushed message to client '{}'", id);
            Ok(())
        } else {
            Err(MessagePushError::ClientNotFound(id.to_string()))
        }
    }

    async fn broadcast(&self, targets: Vec<ParticipantId>, content: &str) {
        let clients = self.clients.lock().await;

        for target in targets {
            if let Some(sender) = clients.get(&target) {
                // ブロードキャストでは一部の送信失敗を許容
                if let Err(e) = sender.send(content.to_string()) {
                    tracing::warn!("Failed to push message to client '{}': {}", target, e);
                } else {
                    tracing::debug!("Broadcasted message to client '{}'", target);
                }
            } else {
                tracing::warn!("Client '{}' not found during broadcast, skipping", target);
            }
        }
    }
}
