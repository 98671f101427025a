//! Domain layer: pure models and boundary traits for the signaling broker.
//!
//! このレイヤーはトランスポート（axum / WebSocket）に依存しない。
//! Room（参加者レジストリ + ルームポリシー）が中核で、MessagePusher と
//! RoomDirectory が外部への境界（依存性の逆転）となる。

mod directory;
mod error;
mod participant;
mod pusher;
mod room;

pub use directory::{RoomDirectory, SharedRoom};
pub use error::DomainError;
pub use participant::{DisplayName, Participant, ParticipantId, ParticipantState};
pub use pusher::{MessagePushError, MessagePusher, PusherChannel};
#[cfg(test)]
pub use pusher::MockMessagePusher;
pub use room::{Room, RoomName};
