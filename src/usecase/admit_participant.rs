//! UseCase: 参加者の入室処理（attach と admit）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - attach: join ハンドシェイク前のプレースホルダ登録
//! - admit: 入室ステートマシン（ホスト選出、承認制、保留入り）
//!
//! ### なぜこのテストが必要か
//! - ホスト選出の検証：最初の参加者が無条件にホスト兼承認済みになる
//! - 承認制ルームで後続参加者が Pending になり、ロスターに漏れないことを保証
//! - ロック中のルームへの join が拒否されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：空ルームへの初回 join（ホスト選出）、通常 join、承認制 join
//! - 異常系：ロック済みルームへの join、admit 前に消えたプレースホルダ
//! - エッジケース：teardown と競合して retired になったルームへの attach

use std::sync::Arc;

use crate::common::time::now_unix_millis;
use crate::domain::{
    DisplayName, MessagePusher, ParticipantId, ParticipantState, PusherChannel, RoomDirectory,
    RoomName, SharedRoom,
};
use crate::infrastructure::dto::websocket::{ParticipantInfo, RoomMetaDto, ServerMessage};

use super::error::AdmitError;
use super::fanout;

/// How a join was classified by the admission state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitOutcome {
    /// Elected host, unconditionally approved
    Host,
    /// Approved regular participant
    Approved,
    /// Waiting for host approval
    Pending,
}

/// 参加者入室のユースケース
pub struct AdmitParticipantUseCase {
    directory: Arc<dyn RoomDirectory>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl AdmitParticipantUseCase {
    pub fn new(directory: Arc<dyn RoomDirectory>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            directory,
            message_pusher,
        }
    }

    /// Attach a new connection to a room before its join handshake.
    ///
    /// Inserts a provisional placeholder (so concurrent host actions
    /// referencing the id are safe) and registers the outbound channel.
    /// Retries when the fetched room handle lost a race against teardown.
    pub async fn attach(
        &self,
        room_name: &RoomName,
        sender: PusherChannel,
    ) -> (SharedRoom, ParticipantId) {
        loop {
            let handle = self.directory.get_or_create(room_name).await;
            let id = {
                let mut room = handle.lock().await;
                if room.retired {
                    // Stale handle: the room was deleted between fetch and lock
                    continue;
                }
                room.add_placeholder(now_unix_millis())
            };
            self.message_pusher.register_client(id.clone(), sender).await;
            return (handle, id);
        }
    }

    /// Run the admission state machine for a completed `join` handshake.
    ///
    /// On success the joiner has received its `welcome` or `waiting` message
    /// and everyone who needs to know has been notified. On failure the
    /// caller is expected to report the error and close the connection.
    pub async fn admit(
        &self,
        room: &SharedRoom,
        id: &ParticipantId,
        display_name: Option<&str>,
    ) -> Result<AdmitOutcome, AdmitError> {
        let mut guard = room.lock().await;
        let room = &mut *guard;

        if room.locked {
            fanout::push_error(&*self.message_pusher, id, "room is locked".to_string()).await;
            return Err(AdmitError::RoomLocked);
        }
        if room.participant(id).is_none() {
            return Err(AdmitError::NotAttached(id.to_string()));
        }

        let name = DisplayName::from_input(display_name, id);
        room.set_name(id, name)
            .map_err(|_| AdmitError::NotAttached(id.to_string()))?;

        // Host election: the first joiner becomes host and is never pending,
        // regardless of room policy.
        let outcome = if room.current_host().is_none() {
            room.set_host(id)
                .map_err(|_| AdmitError::NotAttached(id.to_string()))?;
            AdmitOutcome::Host
        } else if room.require_approval {
            AdmitOutcome::Pending
        } else {
            AdmitOutcome::Approved
        };

        match outcome {
            AdmitOutcome::Host | AdmitOutcome::Approved => {
                room.set_state(id, ParticipantState::Approved)
                    .map_err(|_| AdmitError::NotAttached(id.to_string()))?;
                self.enter_approved(room, id).await;
            }
            AdmitOutcome::Pending => {
                room.set_state(id, ParticipantState::Pending)
                    .map_err(|_| AdmitError::NotAttached(id.to_string()))?;
                self.enter_pending(room, id).await;
            }
        }

        Ok(outcome)
    }

    /// Approved entry: welcome the joiner, notify the rest, sync hosts
    async fn enter_approved(&self, room: &crate::domain::Room, id: &ParticipantId) {
        let pusher = &*self.message_pusher;

        let welcome = ServerMessage::Welcome {
            id: id.to_string(),
            participants: fanout::approved_infos(room),
            host_id: room.current_host().map(|h| h.to_string()),
            room: RoomMetaDto::from(room),
        };
        if let Err(e) = pusher.push_to(id, &welcome.to_json()).await {
            tracing::warn!("Failed to send welcome to client '{}': {}", id, e);
        }

        if let Some(joiner) = room.participant(id) {
            let joined = ServerMessage::ParticipantJoined {
                id: joiner.id.to_string(),
                name: joiner.display_name.to_string(),
            };
            fanout::broadcast_to_approved(room, pusher, &joined, Some(id)).await;
        }

        fanout::broadcast_roster(room, pusher).await;
        // The join did not change the pending list, but pushing it keeps the
        // host UI synchronized.
        fanout::push_pending_to_hosts(room, pusher).await;
    }

    /// Pending entry: park the joiner, notify every host
    async fn enter_pending(&self, room: &crate::domain::Room, id: &ParticipantId) {
        let pusher = &*self.message_pusher;

        let waiting = ServerMessage::Waiting {
            message: "waiting for the host to approve you".to_string(),
        };
        if let Err(e) = pusher.push_to(id, &waiting.to_json()).await {
            tracing::warn!("Failed to send waiting notice to client '{}': {}", id, e);
        }

        if let Some(joiner) = room.participant(id) {
            let request = ServerMessage::JoinRequest {
                participant: ParticipantInfo::from(joiner),
            };
            let hosts: Vec<ParticipantId> = room.hosts().map(|p| p.id.clone()).collect();
            pusher.broadcast(hosts, &request.to_json()).await;
        }

        fanout::push_pending_to_hosts(room, pusher).await;
    }
}
