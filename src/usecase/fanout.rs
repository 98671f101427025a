//! Shared fan-out helpers used by several usecases.
//!
//! These are pure snapshot-builders plus thin broadcast wrappers. They must
//! be called with the room lock held so every fan-out sees one consistent
//! registry snapshot.

use crate::domain::{MessagePusher, ParticipantId, Room};
use crate::infrastructure::dto::websocket::{ParticipantInfo, ServerMessage};

/// Roster snapshot: approved participants in insertion order
pub(crate) fn approved_infos(room: &Room) -> Vec<ParticipantInfo> {
    room.approved_list().map(ParticipantInfo::from).collect()
}

/// Pending snapshot: pending participants in insertion order
pub(crate) fn pending_infos(room: &Room) -> Vec<ParticipantInfo> {
    room.pending_list().map(ParticipantInfo::from).collect()
}

/// The `participants-update` message for the room's current state
pub(crate) fn roster_update(room: &Room) -> ServerMessage {
    ServerMessage::ParticipantsUpdate {
        participants: approved_infos(room),
        host_id: room.current_host().map(|id| id.to_string()),
    }
}

/// Broadcast a message to every approved participant, optionally excluding one
pub(crate) async fn broadcast_to_approved(
    room: &Room,
    pusher: &dyn MessagePusher,
    message: &ServerMessage,
    exclude: Option<&ParticipantId>,
) {
    let targets: Vec<ParticipantId> = room
        .approved_list()
        .filter(|p| Some(&p.id) != exclude)
        .map(|p| p.id.clone())
        .collect();
    pusher.broadcast(targets, &message.to_json()).await;
}

/// Broadcast the refreshed roster to every approved participant
pub(crate) async fn broadcast_roster(room: &Room, pusher: &dyn MessagePusher) {
    broadcast_to_approved(room, pusher, &roster_update(room), None).await;
}

/// Push the refreshed pending list to every host
pub(crate) async fn push_pending_to_hosts(room: &Room, pusher: &dyn MessagePusher) {
    let message = ServerMessage::Pending {
        pending: pending_infos(room),
    };
    let hosts: Vec<ParticipantId> = room.hosts().map(|p| p.id.clone()).collect();
    pusher.broadcast(hosts, &message.to_json()).await;
}

/// Push a targeted protocol error to one participant, swallowing delivery failure
pub(crate) async fn push_error(pusher: &dyn MessagePusher, id: &ParticipantId, message: String) {
    let error = ServerMessage::Error { message };
    if let Err(e) = pusher.push_to(id, &error.to_json()).await {
        tracing::warn!("Failed to push error to client '{}': {}", id, e);
    }
}
