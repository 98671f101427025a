//! Server state and connection management.

use std::sync::Arc;

use crate::usecase::{
    AdmitParticipantUseCase, DisconnectParticipantUseCase, GetRoomStateUseCase,
    ModerateRoomUseCase, RelaySignalUseCase, RenameParticipantUseCase, SendChatUseCase,
};

/// Shared application state
pub struct AppState {
    /// AdmitParticipantUseCase（参加者入室のユースケース）
    pub admit_participant_usecase: Arc<AdmitParticipantUseCase>,
    /// DisconnectParticipantUseCase（切断処理のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// SendChatUseCase（チャット送信のユースケース）
    pub send_chat_usecase: Arc<SendChatUseCase>,
    /// RelaySignalUseCase（シグナリング中継のユースケース）
    pub relay_signal_usecase: Arc<RelaySignalUseCase>,
    /// RenameParticipantUseCase（表示名変更のユースケース）
    pub rename_participant_usecase: Arc<RenameParticipantUseCase>,
    /// ModerateRoomUseCase（モデレーションのユースケース）
    pub moderate_room_usecase: Arc<ModerateRoomUseCase>,
    /// GetRoomStateUseCase（ルーム状態取得のユースケース）
    pub get_room_state_usecase: Arc<GetRoomStateUseCase>,
}
