//! UseCase: 切断処理とルームの後片付け
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 退出の通知、ホスト継承、空ルームの削除
//!
//! ### なぜこのテストが必要か
//! - ホスト退出時に挿入順で最初の承認済み参加者へホストが継承されることを保証
//! - 承認済みの退出だけが participant-left になることを確認
//! - 最後の参加者の退出でルームが削除されることを検証
//!
//! ### どのような状況を想定しているか
//! - 正常系：承認済み参加者の退出、ホストの退出
//! - 異常系：既に除去済みの参加者の切断（冪等）
//! - エッジケース：保留中参加者の退出、最後の 1 人の退出

use std::sync::Arc;

use crate::domain::{MessagePusher, ParticipantId, RoomDirectory, RoomName, SharedRoom};
use crate::infrastructure::dto::websocket::ServerMessage;

use super::fanout;

/// 切断処理のユースケース
pub struct DisconnectParticipantUseCase {
    directory: Arc<dyn RoomDirectory>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectParticipantUseCase {
    pub fn new(directory: Arc<dyn RoomDirectory>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            directory,
            message_pusher,
        }
    }

    /// Clean up after a closed connection. Idempotent: a participant already
    /// removed by a moderation action leaves nothing to do beyond channel
    /// cleanup and the empty-room check.
    ///
    /// Runs for every connection exactly once, whatever the close reason
    /// (client close, network failure, kick, handshake timeout).
    pub async fn execute(&self, room: &SharedRoom, room_name: &RoomName, id: &ParticipantId) {
        {
            let mut guard = room.lock().await;
            let room = &mut *guard;
            let pusher = &*self.message_pusher;

            if let Some(leaver) = room.remove(id) {
                // Host succession: first approved participant by insertion
                // order. With only pending participants left the room has no
                // host until one of them is approved by nobody, so it simply
                // drains.
                let mut host_changed = false;
                if leaver.is_host {
                    let successor = room.approved_list().next().map(|p| p.id.clone());
                    if let Some(successor) = successor {
                        if room.set_host(&successor).is_ok() {
                            host_changed = true;
                            tracing::info!(
                                "Host left room '{}'; promoted '{}'",
                                room.name,
                                successor
                            );
                        }
                    }
                }

                if leaver.is_approved() {
                    let left = ServerMessage::ParticipantLeft {
                        id: leaver.id.to_string(),
                        name: leaver.display_name.to_string(),
                    };
                    fanout::broadcast_to_approved(room, pusher, &left, None).await;
                    fanout::broadcast_roster(room, pusher).await;
                } else if host_changed {
                    fanout::broadcast_roster(room, pusher).await;
                }

                // A pending leaver shrinks the hosts' approval queue; an
                // approved leaver may have been a host, so refresh either way.
                // An AwaitingJoin leaver was never visible anywhere, so there
                // is nothing to announce.
                if leaver.is_approved() || leaver.is_pending() {
                    fanout::push_pending_to_hosts(room, pusher).await;
                }
            }

            pusher.unregister_client(id).await;
        }

        // Lock order is directory → room, so the room lock must be released
        // before the teardown check.
        self.directory.remove_if_empty(room_name).await;
    }
}
