//! Infrastructure layer: concrete implementations of the domain boundaries
//! plus wire-format DTOs.

pub mod directory;
pub mod dto;
pub mod message_pusher;
