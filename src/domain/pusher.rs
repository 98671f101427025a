//! MessagePusher: the outbound delivery boundary.
//!
//! ## 責務
//!
//! - 接続中クライアントの `UnboundedSender` を管理する
//! - クライアントへのメッセージ送信（push_to, broadcast）
//!
//! WebSocket の生成は UI 層の責務で、この trait は生成済みの sender を
//! 受け取って送信にだけ使う。送信はチャネルへの enqueue なのでブロック
//! しない。実際のソケット書き込みはクライアントごとの pusher タスクが行う。

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::participant::ParticipantId;

/// Channel used to push outbound text frames to one client's pusher task
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Errors raised by message delivery
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// No channel registered for the participant
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    /// The client's channel is closed
    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// Abstraction over per-client outbound delivery (dependency inversion)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Register a client's outbound channel
    async fn register_client(&self, id: ParticipantId, sender: PusherChannel);

    /// Remove a client's outbound channel.
    ///
    /// Dropping the sender closes the client's pusher task, which in turn
    /// closes the WebSocket. This doubles as the force-close used by
    /// `reject` and `kick`. Idempotent.
    async fn unregister_client(&self, id: &ParticipantId);

    /// Push a message to one client
    async fn push_to(&self, id: &ParticipantId, content: &str) -> Result<(), MessagePushError>;

    /// Push a message to many clients, swallowing per-recipient failures.
    ///
    /// A slow or dead recipient never blocks delivery to the rest;
    /// failed sends are reconciled later by disconnect detection.
    async fn broadcast(&self, targets: Vec<ParticipantId>, content: &str);
}
