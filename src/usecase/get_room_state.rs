//! UseCase: ルーム状態の取得（HTTP API 向けの読み取り専用スナップショット）

use std::sync::Arc;

use crate::domain::{Room, RoomDirectory, RoomName};

use super::error::GetRoomStateError;

/// ルーム状態取得のユースケース
pub struct GetRoomStateUseCase {
    directory: Arc<dyn RoomDirectory>,
}

impl GetRoomStateUseCase {
    pub fn new(directory: Arc<dyn RoomDirectory>) -> Self {
        Self { directory }
    }

    /// Snapshot one room by name
    pub async fn execute(&self, name: &RoomName) -> Result<Room, GetRoomStateError> {
        let Some(room) = self.directory.get(name).await else {
            return Err(GetRoomStateError::RoomNotFound);
        };
        let snapshot = room.lock().await.clone();
        if snapshot.retired {
            return Err(GetRoomStateError::RoomNotFound);
        }
        Ok(snapshot)
    }

    /// Snapshot every live room, sorted by name for stable API output
    pub async fn rooms(&self) -> Vec<Room> {
        let mut snapshots = Vec::new();
        for name in self.directory.room_names().await {
            if let Some(room) = self.directory.get(&name).await {
                let snapshot = room.lock().await.clone();
                if !snapshot.retired {
                    snapshots.push(snapshot);
                }
            }
        }
        snapshots.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        snapshots
    }
}
