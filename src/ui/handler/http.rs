//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    common::time::timestamp_to_rfc3339,
    domain::{Room, RoomName},
    infrastructure::dto::{
        http::{RoomDetailDto, RoomSummaryDto},
        websocket::{ParticipantInfo, RoomMetaDto},
    },
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.get_room_state_usecase.rooms().await;

    // Domain Model から DTO への変換
    let room_summaries: Vec<RoomSummaryDto> = rooms
        .iter()
        .map(|room| RoomSummaryDto {
            name: room.name.to_string(),
            participant_count: room.len(),
            created_at: timestamp_to_rfc3339(room.created_at),
        })
        .collect();

    Json(room_summaries)
}

/// Get room detail by name
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let room_name = RoomName::new(room).map_err(|_| StatusCode::BAD_REQUEST)?;
    match state.get_room_state_usecase.execute(&room_name).await {
        Ok(room) => Ok(Json(to_detail_dto(&room))),
        Err(crate::usecase::GetRoomStateError::RoomNotFound) => Err(StatusCode::NOT_FOUND),
    }
}

/// Domain Model から DTO への変換
fn to_detail_dto(room: &Room) -> RoomDetailDto {
    RoomDetailDto {
        name: room.name.to_string(),
        participants: room.approved_list().map(ParticipantInfo::from).collect(),
        pending: room.pending_list().map(ParticipantInfo::from).collect(),
        host_id: room.current_host().map(|id| id.to_string()),
        meta: RoomMetaDto::from(room),
        created_at: timestamp_to_rfc3339(room.created_at),
    }
}
