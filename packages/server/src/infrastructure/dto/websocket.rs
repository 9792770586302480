//! WebSocket frame DTOs.

use serde::{Deserialize, Serialize};

/// Frame type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Chat,
    SuperChat,
}

/// Outbound chat frame (JSON text frame)
///
/// The room is implied by the connection and is not repeated per frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatFrame {
    pub r#type: MessageType,
    pub username: String,
    pub message: String,
    /// RFC 3339 (UTC)
    pub timestamp: String,
    pub super_chat: bool,
}
