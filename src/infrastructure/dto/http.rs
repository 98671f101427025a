//! HTTP API DTOs for the read-only inspection endpoints.

use serde::{Deserialize, Serialize};

use super::websocket::{ParticipantInfo, RoomMetaDto};

/// Summary of one room for the room list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub name: String,
    pub participant_count: usize,
    pub created_at: String,
}

/// Full room state: the same roster/pending/meta shape as the welcome message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDetailDto {
    pub name: String,
    pub participants: Vec<ParticipantInfo>,
    pub pending: Vec<ParticipantInfo>,
    pub host_id: Option<String>,
    pub meta: RoomMetaDto,
    pub created_at: String,
}
