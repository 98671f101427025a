//! UseCase: チャットメッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendChatUseCase::execute() メソッド
//! - チャットの承認済み参加者へのブロードキャスト（送信者は除く）
//!
//! ### なぜこのテストが必要か
//! - 保留中の送信者がチャットできないこと（一貫したポリシー）を保証
//! - 保留中の参加者には決して配信されないことを確認
//! - 本文の切り詰め（2000 文字）を検証
//!
//! ### どのような状況を想定しているか
//! - 正常系：承認済み送信者からのブロードキャスト
//! - 異常系：保留中の送信者、存在しない送信者
//! - エッジケース：送信者しかいないルーム（配信対象なし）

use std::sync::Arc;

use crate::domain::{MessagePusher, ParticipantId, SharedRoom};
use crate::infrastructure::dto::websocket::{ServerMessage, truncate_chat_text};

use super::error::ChatError;
use super::fanout;

/// チャット送信のユースケース
pub struct SendChatUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl SendChatUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// Broadcast a chat message to every approved participant except the
    /// sender. Best-effort fan-out: individual delivery failures are
    /// swallowed by the pusher.
    pub async fn execute(
        &self,
        room: &SharedRoom,
        sender_id: &ParticipantId,
        text: &str,
    ) -> Result<(), ChatError> {
        let guard = room.lock().await;
        let room = &*guard;
        let pusher = &*self.message_pusher;

        let Some(sender) = room.participant(sender_id) else {
            return Err(ChatError::SenderNotFound(sender_id.to_string()));
        };
        if !sender.is_approved() {
            // Pending participants can neither send nor receive chat.
            fanout::push_error(pusher, sender_id, ChatError::SenderNotApproved.to_string()).await;
            return Err(ChatError::SenderNotApproved);
        }

        let message = ServerMessage::Chat {
            from: sender.id.to_string(),
            name: sender.display_name.to_string(),
            text: truncate_chat_text(text),
        };
        fanout::broadcast_to_approved(room, pusher, &message, Some(sender_id)).await;

        Ok(())
    }
}
