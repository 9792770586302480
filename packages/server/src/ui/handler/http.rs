//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
};

use crate::{
    domain::RoomId,
    infrastructure::dto::http::{MessageResponse, RoomSummaryDto, SuperChatRequest},
    ui::state::AppState,
};

use super::error::ApiError;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of live rooms
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoomSummaryDto>>, ApiError> {
    let rooms = state.list_rooms_usecase.execute().await?;

    // Domain Model から DTO への変換
    Ok(Json(rooms.into_iter().map(RoomSummaryDto::from).collect()))
}

/// Privileged broadcast to a room
///
/// Requires `Authorization: Bearer <session token>`.
pub async fn super_chat(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<i64>,
    headers: HeaderMap,
    Json(request): Json<SuperChatRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let room_id = RoomId::try_from(room_id)?;
    let token = bearer_token(&headers);

    state
        .super_chat_usecase
        .execute(room_id, token, request.message)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "message sent".to_string(),
        }),
    ))
}

/// Token from an `Authorization: Bearer` header, if any
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
