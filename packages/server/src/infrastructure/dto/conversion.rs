//! Conversion logic between DTOs and domain entities.

use parlor_shared::time::timestamp_to_rfc3339;

use crate::domain::entity::{Message, RoomSummary};
use crate::infrastructure::dto::{http, websocket as ws};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&Message> for ws::ChatFrame {
    fn from(model: &Message) -> Self {
        let r#type = if model.is_super() {
            ws::MessageType::SuperChat
        } else {
            ws::MessageType::Chat
        };
        Self {
            r#type,
            username: model.sender().as_str().to_string(),
            message: model.payload().to_text_lossy().into_owned(),
            timestamp: timestamp_to_rfc3339(model.timestamp().value()),
            super_chat: model.is_super(),
        }
    }
}

impl From<RoomSummary> for http::RoomSummaryDto {
    fn from(model: RoomSummary) -> Self {
        Self {
            id: model.id.value(),
            member_count: model.member_count,
            created_at: timestamp_to_rfc3339(model.created_at.value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, Payload, RoomId, Timestamp};

    #[test]
    fn test_domain_message_to_chat_frame() {
        // テスト項目: 通常メッセージが chat フレームに変換される
        // given (前提条件):
        let message = Message::new(
            DisplayName::new("alice".to_string()).unwrap(),
            Payload::new("Hello!").unwrap(),
            Timestamp::new(1672531200000),
            RoomId::new(42).unwrap(),
        );

        // when (操作):
        let frame = ws::ChatFrame::from(&message);

        // then (期待する結果):
        assert_eq!(frame.r#type, ws::MessageType::Chat);
        assert_eq!(frame.username, "alice");
        assert_eq!(frame.message, "Hello!");
        assert_eq!(frame.timestamp, "2023-01-01T00:00:00.000Z");
        assert!(!frame.super_chat);
    }

    #[test]
    fn test_super_message_to_chat_frame_json() {
        // テスト項目: スーパーメッセージは super_chat フラグ付きの JSON になる
        // given (前提条件):
        let message = Message::new_super(
            DisplayName::new("admin".to_string()).unwrap(),
            Payload::new("Heads up").unwrap(),
            Timestamp::new(0),
            RoomId::new(1).unwrap(),
        );

        // when (操作):
        let json = serde_json::to_value(ws::ChatFrame::from(&message)).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            serde_json::json!({
                "type": "super_chat",
                "username": "admin",
                "message": "Heads up",
                "timestamp": "1970-01-01T00:00:00.000Z",
                "super_chat": true,
            })
        );
    }

    #[test]
    fn test_room_summary_to_dto() {
        // テスト項目: ルームの概要が DTO に変換される
        // given (前提条件):
        let summary = RoomSummary {
            id: RoomId::new(7).unwrap(),
            member_count: 3,
            created_at: Timestamp::new(1672531200123),
        };

        // when (操作):
        let dto: http::RoomSummaryDto = summary.into();

        // then (期待する結果):
        assert_eq!(dto.id, 7);
        assert_eq!(dto.member_count, 3);
        assert_eq!(dto.created_at, "2023-01-01T00:00:00.123Z");
    }
}
