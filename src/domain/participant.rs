//! Participant domain models.
//!
//! ## 設計ノート
//!
//! - `ParticipantId` はサーバー側で採番する（クライアントは自分の ID を
//!   名乗れない）。UUID v4 なのでプロセス全体で一意。
//! - `ParticipantState` は入室ステートマシンの閉じた直和型。
//!   `AwaitingJoin` のプレースホルダは join ハンドシェイク完了前から
//!   レジストリに存在するが、ロスターにも保留リストにも現れない。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a display name, in characters
pub const MAX_DISPLAY_NAME_CHARS: usize = 64;

/// Opaque participant identifier, assigned by the coordinator at connect time.
///
/// Stable for the lifetime of the connection, never client-supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Generate a fresh unique id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Mutable display name, bounded to [`MAX_DISPLAY_NAME_CHARS`] characters.
///
/// Overlong input is truncated on a char boundary, never rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayName(String);

impl DisplayName {
    /// Build a display name from client input, truncating to the limit.
    ///
    /// `None` or empty input falls back to a name derived from the id.
    pub fn from_input(input: Option<&str>, id: &ParticipantId) -> Self {
        match input {
            Some(name) if !name.trim().is_empty() => {
                Self(name.chars().take(MAX_DISPLAY_NAME_CHARS).collect())
            }
            _ => Self::default_for(id),
        }
    }

    /// Default name derived from the participant id
    pub fn default_for(id: &ParticipantId) -> Self {
        let prefix: String = id.as_str().chars().take(8).collect();
        Self(format!("guest-{}", prefix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DisplayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Admission state of a participant within a room.
///
/// `Connecting -> AwaitingJoin -> {Approved | Pending} -> Removed`
/// (`Connecting` and `Removed` exist only outside the registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParticipantState {
    /// Connected, join handshake not yet completed. Invisible to everyone.
    AwaitingJoin,
    /// Fully admitted: appears in the roster, receives chat and signaling.
    Approved,
    /// Joined but not approved: visible only to hosts in `pending` payloads.
    Pending,
}

/// One connected client within a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: DisplayName,
    pub state: ParticipantState,
    pub is_host: bool,
    /// Unix timestamp when connected (UTC, milliseconds)
    pub connected_at: i64,
}

impl Participant {
    /// Create a new placeholder participant awaiting its join handshake
    pub fn placeholder(connected_at: i64) -> Self {
        let id = ParticipantId::generate();
        let display_name = DisplayName::default_for(&id);
        Self {
            id,
            display_name,
            state: ParticipantState::AwaitingJoin,
            is_host: false,
            connected_at,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.state == ParticipantState::Approved
    }

    pub fn is_pending(&self) -> bool {
        self.state == ParticipantState::Pending
    }
}
