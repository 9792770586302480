//! HTTP API DTOs.

use serde::{Deserialize, Serialize};

/// Body of a privileged broadcast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuperChatRequest {
    pub message: String,
}

/// Generic `{"message": ...}` acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `{"error": ...}` body for rejected requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Live room as listed by `GET /api/rooms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub id: i64,
    pub member_count: usize,
    /// RFC 3339 (UTC)
    pub created_at: String,
}
