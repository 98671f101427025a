//! Domain-level errors.

use thiserror::Error;

/// Errors raised by domain model operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Room name must be a non-empty string
    #[error("room name must not be empty")]
    EmptyRoomName,

    /// Referenced participant does not exist in the room
    #[error("participant '{0}' not found")]
    ParticipantNotFound(String),
}
