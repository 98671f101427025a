//! UseCase: シグナリングメッセージの中継処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RelaySignalUseCase::execute() メソッド
//! - offer / answer / ice-candidate のターゲット限定転送
//!
//! ### なぜこのテストが必要か
//! - 送信者 ID の刻印（詐称防止）を保証
//! - 未承認ターゲットへの転送が遮断され、送信者にエラーが返ることを確認
//! - ブロードキャストされないこと（常に 1 対 1）を検証
//!
//! ### どのような状況を想定しているか
//! - 正常系：承認済みターゲットへの転送
//! - 異常系：存在しないターゲット、保留中のターゲット

use std::sync::Arc;

use crate::domain::{MessagePusher, ParticipantId, SharedRoom};
use crate::infrastructure::dto::websocket::{ServerMessage, SignalKind, SignalPayload};

use super::error::RelayError;
use super::fanout;

/// シグナリング中継のユースケース
pub struct RelaySignalUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl RelaySignalUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// Forward a handshake message verbatim to its target, stamping the
    /// sender id. Delivered only when the target exists and is approved;
    /// otherwise the sender receives a targeted error. Never broadcast.
    pub async fn execute(
        &self,
        room: &SharedRoom,
        sender_id: &ParticipantId,
        kind: SignalKind,
        payload: SignalPayload,
    ) -> Result<(), RelayError> {
        let guard = room.lock().await;
        let room = &*guard;
        let pusher = &*self.message_pusher;

        let target_id = ParticipantId::from(payload.to.clone());
        let error = match room.participant(&target_id) {
            None => Some(RelayError::TargetNotFound(payload.to.clone())),
            Some(target) if !target.is_approved() => {
                Some(RelayError::TargetNotApproved(payload.to.clone()))
            }
            Some(_) => None,
        };
        if let Some(error) = error {
            fanout::push_error(pusher, sender_id, error.to_string()).await;
            return Err(error);
        }

        let forwarded = ServerMessage::forwarded_signal(kind, sender_id.to_string(), payload);
        if let Err(e) = pusher.push_to(&target_id, &forwarded.to_json()).await {
            // Treated as an impending disconnect; reconciled by the transport.
            tracing::warn!("Failed to relay signal to client '{}': {}", target_id, e);
        }

        Ok(())
    }
}
