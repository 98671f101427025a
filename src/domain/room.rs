//! Room domain model: the per-room participant registry and room policy.
//!
//! ## 設計ノート
//!
//! Room はこのシステムの中核で、参加者レジストリ（挿入順を保持する
//! `Vec<Participant>`）とルームポリシー（承認制・ロック）を持つ。
//! ここでの操作は純粋なフィールド変更のみで、通知のブロードキャストは
//! 呼び出し側（UseCase 層）の責務。
//!
//! 不変条件:
//! - `is_host == true` の参加者は常に高々 1 人
//! - `Pending` / `AwaitingJoin` の参加者はロスター（`approved_list`）に
//!   決して現れない

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::participant::{Participant, ParticipantId, ParticipantState};

/// Caller-supplied room identifier. Opaque, only required to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomName(String);

impl RoomName {
    pub fn new(name: String) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::EmptyRoomName);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One room: participant registry plus room-wide policy flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub name: RoomName,
    /// Registry in insertion order. Rooms are small, so linear scans are fine.
    pub participants: Vec<Participant>,
    /// When true, non-host joiners enter as `Pending` until a host accepts them
    pub require_approval: bool,
    /// When true, new joins are refused at admission
    pub locked: bool,
    /// Set by the directory when the room has been deleted from the map.
    /// A joiner holding a stale handle must re-fetch instead of using it.
    #[serde(skip)]
    pub retired: bool,
    /// Unix timestamp when created (UTC, milliseconds)
    pub created_at: i64,
}

impl Room {
    pub fn new(name: RoomName, created_at: i64) -> Self {
        Self {
            name,
            participants: Vec::new(),
            require_approval: false,
            locked: false,
            retired: false,
            created_at,
        }
    }

    /// Insert a provisional placeholder participant and return its fresh id.
    ///
    /// The placeholder exists before the join handshake completes so that
    /// concurrent host actions referencing the id are safe.
    pub fn add_placeholder(&mut self, connected_at: i64) -> ParticipantId {
        let participant = Participant::placeholder(connected_at);
        let id = participant.id.clone();
        self.participants.push(participant);
        id
    }

    /// Look up a participant by id
    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    fn participant_mut(&mut self, id: &ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| &p.id == id)
    }

    /// Update a participant's display name. Pure field mutation.
    pub fn set_name(
        &mut self,
        id: &ParticipantId,
        name: super::participant::DisplayName,
    ) -> Result<(), DomainError> {
        let participant = self
            .participant_mut(id)
            .ok_or_else(|| DomainError::ParticipantNotFound(id.to_string()))?;
        participant.display_name = name;
        Ok(())
    }

    /// Update a participant's admission state. Pure field mutation.
    pub fn set_state(
        &mut self,
        id: &ParticipantId,
        state: ParticipantState,
    ) -> Result<(), DomainError> {
        let participant = self
            .participant_mut(id)
            .ok_or_else(|| DomainError::ParticipantNotFound(id.to_string()))?;
        participant.state = state;
        Ok(())
    }

    /// Make `id` the sole host, clearing the host bit on everyone else.
    ///
    /// Preserves the at-most-one-host invariant by construction.
    pub fn set_host(&mut self, id: &ParticipantId) -> Result<(), DomainError> {
        if self.participant(id).is_none() {
            return Err(DomainError::ParticipantNotFound(id.to_string()));
        }
        for p in &mut self.participants {
            p.is_host = &p.id == id;
        }
        Ok(())
    }

    /// Delete and return the participant, or `None` if already absent.
    /// Duplicate removal is an idempotent no-op.
    pub fn remove(&mut self, id: &ParticipantId) -> Option<Participant> {
        let index = self.participants.iter().position(|p| &p.id == id)?;
        Some(self.participants.remove(index))
    }

    /// Approved participants in insertion order
    pub fn approved_list(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.is_approved())
    }

    /// Pending participants in insertion order
    pub fn pending_list(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.is_pending())
    }

    /// Hosts in insertion order (at most one, but iterating keeps fan-out uniform)
    pub fn hosts(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.is_host)
    }

    /// Id of the current host, or `None`
    pub fn current_host(&self) -> Option<&ParticipantId> {
        self.participants.iter().find(|p| p.is_host).map(|p| &p.id)
    }

    /// Total participant count, pending and awaiting included
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
