//! InMemory RoomDirectory 実装
//!
//! ドメイン層が定義する RoomDirectory trait の具体的な実装。
//! HashMap をインメモリのルームテーブルとして使用します。
//!
//! ## teardown と join の競合
//!
//! 「最後の参加者の切断によるルーム削除」と「同じルームへの同時 join」が
//! 競合すると、join 側が map から削除済みの Room ハンドルを掴んだまま
//! 参加者を追加してしまう恐れがある。これを防ぐため、`remove_if_empty` は
//! ディレクトリロックとルームロックの両方を取った上で空なら `retired` を
//! 立ててから map から削除する。join 側はルームロック下で `retired` を
//! 確認し、立っていればハンドルを捨てて再取得する。
//!
//! ロック順序は常に directory → room。逆順は存在しないのでデッドロック
//! しない。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::common::time::now_unix_millis;
use crate::domain::{Room, RoomDirectory, RoomName, SharedRoom};

/// In-memory room table
pub struct InMemoryRoomDirectory {
    rooms: Mutex<HashMap<RoomName, SharedRoom>>,
}

impl InMemoryRoomDirectory {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomDirectory for InMemoryRoomDirectory {
    async fn get_or_create(&self, name: &RoomName) -> SharedRoom {
        let mut rooms = self.rooms.lock().await;
        if let Some(room) = rooms.get(name) {
            return room.clone();
        }
        let room = Arc::new(Mutex::new(Room::new(name.clone(), now_unix_millis())));
        rooms.insert(name.clone(), room.clone());
        tracing::info!("Room '{}' created", name);
        room
    }

    async fn get(&self, name: &RoomName) -> Option<SharedRoom> {
        let rooms = self.rooms.lock().await;
        rooms.get(name).cloned()
    }

    async fn remove_if_empty(&self, name: &RoomName) -> bool {
        let mut rooms = self.rooms.lock().await;
        let Some(handle) = rooms.get(name).cloned() else {
            return false;
        };
        // Both locks held: a concurrent join cannot slip a participant into
        // the room between the emptiness check and the map removal.
        let mut room = handle.lock().await;
        if !room.is_empty() {
            return false;
        }
        room.retired = true;
        rooms.remove(name);
        tracing::info!("Room '{}' is empty, removed from directory", name);
        true
    }

    async fn room_names(&self) -> Vec<RoomName> {
        let rooms = self.rooms.lock().await;
        rooms.keys().cloned().collect()
    }

    async fn count(&self) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.len()
    }
}
