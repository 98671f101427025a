//! Data transfer objects: the wire formats spoken over WebSocket and HTTP.

pub mod http;
pub mod websocket;
