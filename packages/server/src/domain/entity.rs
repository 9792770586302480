//! Domain entities.

use super::value_object::{DisplayName, MessageKind, Payload, RoomId, Timestamp};

/// A chat message flowing through the hub
///
/// Immutable once constructed: the hub shares one instance (behind an `Arc`)
/// between every outbound queue and the history store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    sender: DisplayName,
    payload: Payload,
    timestamp: Timestamp,
    room_id: RoomId,
    kind: MessageKind,
}

impl Message {
    /// Message submitted by a member connection
    pub fn new(
        sender: DisplayName,
        payload: Payload,
        timestamp: Timestamp,
        room_id: RoomId,
    ) -> Self {
        Self {
            sender,
            payload,
            timestamp,
            room_id,
            kind: MessageKind::Normal,
        }
    }

    /// Privileged broadcast injected by an authenticated non-member
    pub fn new_super(
        sender: DisplayName,
        payload: Payload,
        timestamp: Timestamp,
        room_id: RoomId,
    ) -> Self {
        Self {
            kind: MessageKind::Super,
            ..Self::new(sender, payload, timestamp, room_id)
        }
    }

    pub fn sender(&self) -> &DisplayName {
        &self.sender
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn is_super(&self) -> bool {
        self.kind == MessageKind::Super
    }
}

/// Read-only view of a live room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub id: RoomId,
    pub member_count: usize,
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_message_is_normal() {
        // テスト項目: メンバーが送信したメッセージは通常メッセージになる
        // given (前提条件):
        let sender = DisplayName::new("alice".to_string()).unwrap();
        let payload = Payload::new("hello").unwrap();

        // when (操作):
        let message = Message::new(
            sender.clone(),
            payload.clone(),
            Timestamp::new(1000),
            RoomId::new(42).unwrap(),
        );

        // then (期待する結果):
        assert_eq!(message.sender(), &sender);
        assert_eq!(message.payload(), &payload);
        assert_eq!(message.timestamp(), Timestamp::new(1000));
        assert_eq!(message.room_id().value(), 42);
        assert_eq!(message.kind(), MessageKind::Normal);
        assert!(!message.is_super());
    }

    #[test]
    fn test_new_super_message_is_flagged() {
        // テスト項目: 特権ブロードキャストはスーパーメッセージとしてフラグが立つ
        // given (前提条件):
        let sender = DisplayName::new("admin".to_string()).unwrap();

        // when (操作):
        let message = Message::new_super(
            sender,
            Payload::new("announcement").unwrap(),
            Timestamp::new(2000),
            RoomId::new(7).unwrap(),
        );

        // then (期待する結果):
        assert!(message.is_super());
        assert_eq!(message.kind(), MessageKind::Super);
        assert_eq!(message.room_id().value(), 7);
    }
}
