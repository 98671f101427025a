//! WebSocket message codec.
//!
//! Inbound and outbound messages are closed tagged unions keyed by `type`.
//! Unknown variants and malformed payloads fail deserialization at the
//! boundary; the caller decides whether that is fatal (only for the very
//! first message of a connection) or silently dropped (steady state).
//!
//! SDP / ICE payload fields are opaque to the broker: signaling messages keep
//! their extra fields in a flattened JSON map and are forwarded verbatim,
//! with the sender id stamped into `from` so clients cannot spoof identity.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{Participant, Room};

/// Maximum length of a chat message, in characters
pub const MAX_CHAT_CHARS: usize = 2000;

/// Roster entry: id/name pair of one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub id: String,
    pub name: String,
}

impl From<&Participant> for ParticipantInfo {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.display_name.to_string(),
        }
    }
}

/// Room-wide policy flags broadcast to members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMetaDto {
    pub require_approval: bool,
    pub locked: bool,
}

impl From<&Room> for RoomMetaDto {
    fn from(room: &Room) -> Self {
        Self {
            require_approval: room.require_approval,
            locked: room.locked,
        }
    }
}

/// Opaque signaling payload: a target id plus whatever SDP/ICE fields the
/// client attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalPayload {
    pub to: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Which of the three relayed handshake message types a signal is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

/// Host moderation actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Accept,
    Reject,
    Mute,
    Kick,
    MakeHost,
    SetApproval,
    LockRoom,
    UnlockRoom,
}

/// Commands pushed to a single client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    ForceMute,
    YouAreKicked,
    YouAreRejected,
}

/// Inbound messages (client → server)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    Join {
        #[serde(default, rename = "displayName", alias = "name")]
        display_name: Option<String>,
    },
    Chat {
        text: String,
    },
    Rename {
        #[serde(rename = "displayName", alias = "name")]
        display_name: String,
    },
    Offer(SignalPayload),
    Answer(SignalPayload),
    IceCandidate(SignalPayload),
    Action {
        action: ActionKind,
        #[serde(default)]
        target: Option<String>,
        #[serde(default)]
        value: Option<bool>,
    },
}

impl ClientMessage {
    /// Parse one inbound text frame
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Outbound messages (server → client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    Welcome {
        id: String,
        participants: Vec<ParticipantInfo>,
        host_id: Option<String>,
        room: RoomMetaDto,
    },
    Waiting {
        message: String,
    },
    ParticipantJoined {
        id: String,
        name: String,
    },
    ParticipantLeft {
        id: String,
        name: String,
    },
    ParticipantsUpdate {
        participants: Vec<ParticipantInfo>,
        host_id: Option<String>,
    },
    Pending {
        pending: Vec<ParticipantInfo>,
    },
    JoinRequest {
        participant: ParticipantInfo,
    },
    Chat {
        from: String,
        name: String,
        text: String,
    },
    Command {
        cmd: CommandKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
    },
    RoomMeta {
        meta: RoomMetaDto,
    },
    RoomLock {
        locked: bool,
    },
    Error {
        message: String,
    },
    NeedOffer {
        target: String,
    },
    Offer {
        from: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Answer {
        from: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    IceCandidate {
        from: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl ServerMessage {
    /// Build the forwarded form of a relayed signal, stamping the sender id.
    ///
    /// Client-supplied `from` and `type` keys are stripped from the opaque
    /// payload so they cannot collide with the stamped fields.
    pub fn forwarded_signal(kind: SignalKind, from: String, payload: SignalPayload) -> Self {
        let mut extra = payload.extra;
        extra.remove("from");
        extra.remove("type");
        extra.insert("to".to_string(), Value::String(payload.to));
        match kind {
            SignalKind::Offer => Self::Offer { from, extra },
            SignalKind::Answer => Self::Answer { from, extra },
            SignalKind::IceCandidate => Self::IceCandidate { from, extra },
        }
    }

    /// Serialize to one outbound text frame
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("ServerMessage is always serializable")
    }
}

/// Truncate chat text to [`MAX_CHAT_CHARS`] on a char boundary
pub fn truncate_chat_text(text: &str) -> String {
    text.chars().take(MAX_CHAT_CHARS).collect()
}
