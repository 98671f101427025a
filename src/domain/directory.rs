//! RoomDirectory: the process-wide room table boundary.
//!
//! ## 設計ノート
//!
//! グローバルな可変状態はこの一箇所だけ。暗黙のシングルトンではなく
//! 注入可能なサービスとして扱い、テストでは独立したインスタンスを作る。
//! ディレクトリのロックは map の作成・取得・削除の間だけ保持し、
//! ルーム単位の長い処理では保持しない。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::room::{Room, RoomName};

/// Shared handle to one room. All per-room work serializes on this mutex.
pub type SharedRoom = Arc<Mutex<Room>>;

/// Process-wide map from room name to room, created lazily, removed when empty
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// Get the room, creating it on first reference.
    ///
    /// The returned handle may already be retired if a concurrent teardown
    /// won the race; callers adding a participant must check `Room::retired`
    /// under the room lock and re-fetch when set.
    async fn get_or_create(&self, name: &RoomName) -> SharedRoom;

    /// Get the room if it exists
    async fn get(&self, name: &RoomName) -> Option<SharedRoom>;

    /// Delete the room if its participant count is zero.
    ///
    /// Returns `true` when the room was removed. Marks the room `retired`
    /// under its own lock so stale handles cannot be revived.
    async fn remove_if_empty(&self, name: &RoomName) -> bool;

    /// Names of all live rooms
    async fn room_names(&self) -> Vec<RoomName>;

    /// Number of live rooms
    async fn count(&self) -> usize;
}
