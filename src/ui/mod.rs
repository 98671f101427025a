//! WebRTC signaling server implementation.

mod handler;
mod server;
mod signal;
pub mod state; // UseCase 層と統合テストからアクセスするため public

pub use server::Server;
