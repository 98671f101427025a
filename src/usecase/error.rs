//! UseCase layer errors.
//!
//! Protocol-level failures (routing errors, authorization errors) are pushed
//! back to the offending client by the usecase itself; these enums exist so
//! callers and tests can observe what happened. None of them is fatal to the
//! room or the process.

use thiserror::Error;

/// Errors raised during admission
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmitError {
    /// The room is locked; the join is refused
    #[error("room is locked")]
    RoomLocked,

    /// The placeholder vanished before the join handshake completed
    #[error("participant '{0}' is no longer attached")]
    NotAttached(String),
}

/// Errors raised while relaying a signaling message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("target '{0}' not found")]
    TargetNotFound(String),

    #[error("target '{0}' not approved yet")]
    TargetNotApproved(String),
}

/// Errors raised while handling chat
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// Pending senders may not chat
    #[error("you are not approved yet")]
    SenderNotApproved,

    #[error("sender '{0}' not found")]
    SenderNotFound(String),
}

/// Errors raised while renaming
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenameError {
    #[error("participant '{0}' not found")]
    NotFound(String),
}

/// Errors raised by moderation actions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModerateError {
    /// Actor is not the host
    #[error("only the host can do that")]
    NotHost,

    #[error("action requires a target")]
    MissingTarget,

    #[error("action requires a value")]
    MissingValue,

    #[error("target '{0}' not found")]
    TargetNotFound(String),

    #[error("target '{0}' is not pending")]
    TargetNotPending(String),

    #[error("target '{0}' is not approved")]
    TargetNotApproved(String),
}

/// Errors raised by the inspection usecase
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomStateError {
    #[error("room not found")]
    RoomNotFound,
}
