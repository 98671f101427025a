//! UseCase layer: one struct per broker operation.
//!
//! 各 UseCase は `Arc<dyn RoomDirectory>` / `Arc<dyn MessagePusher>` を
//! 受け取り（依存性の逆転）、ルームのロックを「レジストリ変更 → 送信
//! ファンアウト」のシーケンス全体で保持する。送信はチャネルへの enqueue
//! なのでロック下でもブロックしない。

mod admit_participant;
mod disconnect_participant;
mod error;
mod fanout;
mod get_room_state;
mod moderate_room;
mod relay_signal;
mod rename_participant;
mod send_chat;

pub use admit_participant::{AdmitOutcome, AdmitParticipantUseCase};
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{AdmitError, ChatError, GetRoomStateError, ModerateError, RelayError, RenameError};
pub use get_room_state::GetRoomStateUseCase;
pub use moderate_room::ModerateRoomUseCase;
pub use relay_signal::RelaySignalUseCase;
pub use rename_participant::RenameParticipantUseCase;
pub use send_chat::SendChatUseCase;
