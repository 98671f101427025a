//! UseCase: ホストによるモデレーション処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ModerateRoomUseCase::execute() メソッド
//! - accept / reject / mute / kick / make-host / set-approval /
//!   lock-room / unlock-room の全アクション
//!
//! ### なぜこのテストが必要か
//! - ホスト以外の操作が認可エラーになり、状態が変わらないことを保証
//! - accept で承認された参加者がロスターに入り、既存参加者に
//!   need-offer が配られることを確認（中継器自身はネゴシエーションを
//!   発火しない）
//! - 「高々 1 ホスト」不変条件が make-host で保たれることを検証
//!
//! ### どのような状況を想定しているか
//! - 正常系：各アクションの適用
//! - 異常系：非ホストの操作、不正なターゲット
//! - エッジケース：承認済みターゲットへの reject（冪等な no-op）

use std::sync::Arc;

use crate::domain::{MessagePusher, ParticipantId, ParticipantState, Room, SharedRoom};
use crate::infrastructure::dto::websocket::{
    ActionKind, CommandKind, RoomMetaDto, ServerMessage,
};

use super::error::ModerateError;
use super::fanout;

/// モデレーションのユースケース
pub struct ModerateRoomUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl ModerateRoomUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// Apply one host action. Non-host actors receive an authorization error
    /// and nothing changes. The room lock is held across the whole
    /// mutate-then-fan-out sequence, so concurrent actions (two `make-host`
    /// calls, an accept racing a disconnect) serialize per room.
    pub async fn execute(
        &self,
        room: &SharedRoom,
        actor_id: &ParticipantId,
        action: ActionKind,
        target: Option<String>,
        value: Option<bool>,
    ) -> Result<(), ModerateError> {
        let mut guard = room.lock().await;
        let room = &mut *guard;

        let actor_is_host = room
            .participant(actor_id)
            .map(|p| p.is_host)
            .unwrap_or(false);
        if !actor_is_host {
            self.report(actor_id, ModerateError::NotHost).await;
            return Err(ModerateError::NotHost);
        }

        let result = match action {
            ActionKind::Accept => self.accept(room, target).await,
            ActionKind::Reject => self.reject(room, target).await,
            ActionKind::Mute => self.mute(room, actor_id, target).await,
            ActionKind::Kick => self.kick(room, target).await,
            ActionKind::MakeHost => self.make_host(room, target).await,
            ActionKind::SetApproval => self.set_approval(room, value).await,
            ActionKind::LockRoom => self.set_locked(room, true).await,
            ActionKind::UnlockRoom => self.set_locked(room, false).await,
        };

        if let Err(error) = &result {
            self.report(actor_id, error.clone()).await;
        }
        result
    }

    async fn report(&self, actor_id: &ParticipantId, error: ModerateError) {
        fanout::push_error(&*self.message_pusher, actor_id, error.to_string()).await;
    }

    fn require_target(target: Option<String>) -> Result<ParticipantId, ModerateError> {
        target
            .map(ParticipantId::from)
            .ok_or(ModerateError::MissingTarget)
    }

    /// accept: flip a pending participant to approved and wire it into the room
    async fn accept(&self, room: &mut Room, target: Option<String>) -> Result<(), ModerateError> {
        let target_id = Self::require_target(target)?;
        match room.participant(&target_id) {
            None => return Err(ModerateError::TargetNotFound(target_id.to_string())),
            Some(p) if !p.is_pending() => {
                return Err(ModerateError::TargetNotPending(target_id.to_string()));
            }
            Some(_) => {}
        }
        room.set_state(&target_id, ParticipantState::Approved)
            .map_err(|_| ModerateError::TargetNotFound(target_id.to_string()))?;

        let pusher = &*self.message_pusher;

        let welcome = ServerMessage::Welcome {
            id: target_id.to_string(),
            participants: fanout::approved_infos(room),
            host_id: room.current_host().map(|h| h.to_string()),
            room: RoomMetaDto::from(&*room),
        };
        if let Err(e) = pusher.push_to(&target_id, &welcome.to_json()).await {
            tracing::warn!("Failed to send welcome to client '{}': {}", target_id, e);
        }

        if let Some(accepted) = room.participant(&target_id) {
            let joined = ServerMessage::ParticipantJoined {
                id: accepted.id.to_string(),
                name: accepted.display_name.to_string(),
            };
            fanout::broadcast_to_approved(room, pusher, &joined, Some(&target_id)).await;
        }

        fanout::broadcast_roster(room, pusher).await;
        fanout::push_pending_to_hosts(room, pusher).await;

        // The relay never originates media negotiation; existing peers are
        // told to send an offer toward the newly approved participant.
        let need_offer = ServerMessage::NeedOffer {
            target: target_id.to_string(),
        };
        fanout::broadcast_to_approved(room, pusher, &need_offer, Some(&target_id)).await;

        Ok(())
    }

    /// reject: dismiss a pending participant and force-close its connection.
    /// Rejecting an absent or already-approved target is an idempotent no-op.
    async fn reject(&self, room: &mut Room, target: Option<String>) -> Result<(), ModerateError> {
        let target_id = Self::require_target(target)?;
        match room.participant(&target_id) {
            Some(p) if p.is_pending() => {}
            _ => {
                tracing::debug!("reject on non-pending target '{}' ignored", target_id);
                return Ok(());
            }
        }

        let pusher = &*self.message_pusher;
        let command = ServerMessage::Command {
            cmd: CommandKind::YouAreRejected,
            from: None,
        };
        if let Err(e) = pusher.push_to(&target_id, &command.to_json()).await {
            tracing::warn!("Failed to send rejection to client '{}': {}", target_id, e);
        }
        // Remove now so the hosts' pending refresh is accurate; the target's
        // own disconnect cleanup then finds nothing left to do.
        room.remove(&target_id);
        pusher.unregister_client(&target_id).await;
        fanout::push_pending_to_hosts(room, pusher).await;

        Ok(())
    }

    /// mute: voluntary-compliance command plus an informational room notice
    async fn mute(
        &self,
        room: &Room,
        actor_id: &ParticipantId,
        target: Option<String>,
    ) -> Result<(), ModerateError> {
        let target_id = Self::require_target(target)?;
        let Some(target) = room.participant(&target_id) else {
            return Err(ModerateError::TargetNotFound(target_id.to_string()));
        };

        let pusher = &*self.message_pusher;
        let command = ServerMessage::Command {
            cmd: CommandKind::ForceMute,
            from: Some(actor_id.to_string()),
        };
        if let Err(e) = pusher.push_to(&target_id, &command.to_json()).await {
            tracing::warn!("Failed to send force-mute to client '{}': {}", target_id, e);
        }

        let notice = ServerMessage::Chat {
            from: "system".to_string(),
            name: "system".to_string(),
            text: format!("{} was muted by the host", target.display_name),
        };
        fanout::broadcast_to_approved(room, pusher, &notice, None).await;

        Ok(())
    }

    /// kick: command, then force-close. Registry removal and the departure
    /// broadcasts run through the target's ordinary disconnect cleanup.
    async fn kick(&self, room: &Room, target: Option<String>) -> Result<(), ModerateError> {
        let target_id = Self::require_target(target)?;
        if room.participant(&target_id).is_none() {
            return Err(ModerateError::TargetNotFound(target_id.to_string()));
        }

        let pusher = &*self.message_pusher;
        let command = ServerMessage::Command {
            cmd: CommandKind::YouAreKicked,
            from: None,
        };
        if let Err(e) = pusher.push_to(&target_id, &command.to_json()).await {
            tracing::warn!("Failed to send kick to client '{}': {}", target_id, e);
        }
        pusher.unregister_client(&target_id).await;

        Ok(())
    }

    /// make-host: move the single host bit to the target
    async fn make_host(&self, room: &mut Room, target: Option<String>) -> Result<(), ModerateError> {
        let target_id = Self::require_target(target)?;
        match room.participant(&target_id) {
            None => return Err(ModerateError::TargetNotFound(target_id.to_string())),
            // The host is never pending; moving the bit onto an unapproved
            // participant would break that invariant.
            Some(p) if !p.is_approved() => {
                return Err(ModerateError::TargetNotApproved(target_id.to_string()));
            }
            Some(_) => {}
        }
        room.set_host(&target_id)
            .map_err(|_| ModerateError::TargetNotFound(target_id.to_string()))?;

        fanout::broadcast_roster(room, &*self.message_pusher).await;
        fanout::push_pending_to_hosts(room, &*self.message_pusher).await;

        Ok(())
    }

    /// set-approval: room policy change, not retroactive
    async fn set_approval(&self, room: &mut Room, value: Option<bool>) -> Result<(), ModerateError> {
        let value = value.ok_or(ModerateError::MissingValue)?;
        room.require_approval = value;

        let pusher = &*self.message_pusher;
        let meta = ServerMessage::RoomMeta {
            meta: RoomMetaDto::from(&*room),
        };
        fanout::broadcast_to_approved(room, pusher, &meta, None).await;
        fanout::push_pending_to_hosts(room, pusher).await;

        Ok(())
    }

    /// lock-room / unlock-room: enforced at admission, broadcast to members
    async fn set_locked(&self, room: &mut Room, locked: bool) -> Result<(), ModerateError> {
        room.locked = locked;
        let message = ServerMessage::RoomLock { locked };
        fanout::broadcast_to_approved(room, &*self.message_pusher, &message, None).await;
        Ok(())
    }
}
