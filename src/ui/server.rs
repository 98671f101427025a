//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::usecase::{
    AdmitParticipantUseCase, DisconnectParticipantUseCase, GetRoomStateUseCase,
    ModerateRoomUseCase, RelaySignalUseCase, RenameParticipantUseCase, SendChatUseCase,
};

use super::{
    handler::{get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// WebRTC signaling server
///
/// This struct encapsulates the server configuration and provides methods to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     admit_participant_usecase,
///     disconnect_participant_usecase,
///     send_chat_usecase,
///     relay_signal_usecase,
///     rename_participant_usecase,
///     moderate_room_usecase,
///     get_room_state_usecase,
/// );
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// AdmitParticipantUseCase（参加者入室のユースケース）
    admit_participant_usecase: Arc<AdmitParticipantUseCase>,
    /// DisconnectParticipantUseCase（切断処理のユースケース）
    disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// SendChatUseCase（チャット送信のユースケース）
    send_chat_usecase: Arc<SendChatUseCase>,
    /// RelaySignalUseCase（シグナリング中継のユースケース）
    relay_signal_usecase: Arc<RelaySignalUseCase>,
    /// RenameParticipantUseCase（表示名変更のユースケース）
    rename_participant_usecase: Arc<RenameParticipantUseCase>,
    /// ModerateRoomUseCase（モデレーションのユースケース）
    moderate_room_usecase: Arc<ModerateRoomUseCase>,
    /// GetRoomStateUseCase（ルーム状態取得のユースケース）
    get_room_state_usecase: Arc<GetRoomStateUseCase>,
}

impl Server {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        admit_participant_usecase: Arc<AdmitParticipantUseCase>,
        disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
        send_chat_usecase: Arc<SendChatUseCase>,
        relay_signal_usecase: Arc<RelaySignalUseCase>,
        rename_participant_usecase: Arc<RenameParticipantUseCase>,
        moderate_room_usecase: Arc<ModerateRoomUseCase>,
        get_room_state_usecase: Arc<GetRoomStateUseCase>,
    ) -> Self {
        Self {
            admit_participant_usecase,
            disconnect_participant_usecase,
            send_chat_usecase,
            relay_signal_usecase,
            rename_participant_usecase,
            moderate_room_usecase,
            get_room_state_usecase,
        }
    }

    /// Build the axum router. Exposed so integration tests can serve the
    /// exact production routes on an ephemeral port.
    pub fn router(self) -> Router {
        let app_state = Arc::new(AppState {
            admit_participant_usecase: self.admit_participant_usecase,
            disconnect_participant_usecase: self.disconnect_participant_usecase,
            send_chat_usecase: self.send_chat_usecase,
            relay_signal_usecase: self.relay_signal_usecase,
            rename_participant_usecase: self.rename_participant_usecase,
            moderate_room_usecase: self.moderate_room_usecase,
            get_room_state_usecase: self.get_room_state_usecase,
        });

        Router::new()
            // WebSocket エンドポイント（ルーム名はパスで指定）
            .route("/ws/{room}", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room}", get(get_room_detail))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the WebRTC signaling server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        // Start the server
        tracing::info!(
            "WebRTC signaling server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws/{{room}}", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
