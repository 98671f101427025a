//! UseCase: 表示名の変更処理

use std::sync::Arc;

use crate::domain::{DisplayName, MessagePusher, ParticipantId, SharedRoom};

use super::error::RenameError;
use super::fanout;

/// 表示名変更のユースケース
pub struct RenameParticipantUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl RenameParticipantUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// Update a participant's display name (truncated to the limit), then
    /// refresh the roster for approved participants and the pending list for
    /// hosts. Allowed in any admitted state.
    pub async fn execute(
        &self,
        room: &SharedRoom,
        id: &ParticipantId,
        new_name: &str,
    ) -> Result<(), RenameError> {
        let mut guard = room.lock().await;
        let room = &mut *guard;

        let name = DisplayName::from_input(Some(new_name), id);
        room.set_name(id, name)
            .map_err(|_| RenameError::NotFound(id.to_string()))?;

        let pusher = &*self.message_pusher;
        fanout::broadcast_roster(room, pusher).await;
        fanout::push_pending_to_hosts(room, pusher).await;

        Ok(())
    }
}
