//! WebRTC signaling server with rooms, host moderation and chat.
//!
//! Clients connect over WebSocket, join a named room and exchange SDP / ICE
//! handshake messages through the broker.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin server
//! cargo run --bin server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;
use hiroma::{
    common::logger::setup_logger,
    infrastructure::{directory::InMemoryRoomDirectory, message_pusher::WebSocketMessagePusher},
    ui::Server,
    usecase::{
        AdmitParticipantUseCase, DisconnectParticipantUseCase, GetRoomStateUseCase,
        ModerateRoomUseCase, RelaySignalUseCase, RenameParticipantUseCase, SendChatUseCase,
    },
};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "WebRTC signaling server with rooms and host moderation", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. RoomDirectory
    // 2. MessagePusher
    // 3. UseCases
    // 4. Server

    // 1. Create RoomDirectory (in-memory room table, rooms created on demand)
    let directory = Arc::new(InMemoryRoomDirectory::new());

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 3. Create UseCases
    let admit_participant_usecase = Arc::new(AdmitParticipantUseCase::new(
        directory.clone(),
        message_pusher.clone(),
    ));
    let disconnect_participant_usecase = Arc::new(DisconnectParticipantUseCase::new(
        directory.clone(),
        message_pusher.clone(),
    ));
    let send_chat_usecase = Arc::new(SendChatUseCase::new(message_pusher.clone()));
    let relay_signal_usecase = Arc::new(RelaySignalUseCase::new(message_pusher.clone()));
    let rename_participant_usecase = Arc::new(RenameParticipantUseCase::new(message_pusher.clone()));
    let moderate_room_usecase = Arc::new(ModerateRoomUseCase::new(message_pusher.clone()));
    let get_room_state_usecase = Arc::new(GetRoomStateUseCase::new(directory.clone()));

    // 4. Create and run the server
    let server = Server::new(
        admit_participant_usecase,
        disconnect_participant_usecase,
        send_chat_usecase,
        relay_signal_usecase,
        rename_participant_usecase,
        moderate_room_usecase,
        get_room_state_usecase,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
