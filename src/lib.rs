//! Signaling and presence broker for peer-to-peer sessions.
//!
//! This library implements a WebSocket-based signaling server: clients join
//! named rooms, discover each other, relay WebRTC handshake messages and chat,
//! while a single host per room governs admission and moderation.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// shared library
pub mod common;
