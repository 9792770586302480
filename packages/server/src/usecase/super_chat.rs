//! UseCase: スーパーチャット送信処理
//!
//! 認証済みのユーザーだけが、WebSocket を経由せずに HTTP からルームへ
//! 目立つメッセージを送れます。

use std::sync::Arc;

use parlor_shared::time::Clock;

use crate::{
    domain::{Authenticator, Message, Payload, RoomId, Timestamp},
    hub::Hub,
};

use super::error::SuperChatError;

/// スーパーチャット送信のユースケース
pub struct SuperChatUseCase {
    hub: Hub,
    authenticator: Arc<dyn Authenticator>,
    clock: Arc<dyn Clock>,
    max_message_bytes: usize,
}

impl SuperChatUseCase {
    pub fn new(
        hub: Hub,
        authenticator: Arc<dyn Authenticator>,
        clock: Arc<dyn Clock>,
        max_message_bytes: usize,
    ) -> Self {
        Self {
            hub,
            authenticator,
            clock,
            max_message_bytes,
        }
    }

    /// Authenticate the caller and submit a super message to the room.
    ///
    /// Returns once the hub has accepted the message, not once it was
    /// delivered. A room without members silently drops it.
    pub async fn execute(
        &self,
        room_id: RoomId,
        session_token: Option<&str>,
        text: String,
    ) -> Result<(), SuperChatError> {
        let token = match session_token.map(str::trim) {
            None | Some("") => return Err(SuperChatError::Anonymous),
            Some(token) => token,
        };
        let sender = self.authenticator.authenticate(token).await?;
        let payload = Payload::bounded(text, self.max_message_bytes)?;

        let message = Message::new_super(
            sender,
            payload,
            Timestamp::new(self.clock.now_millis()),
            room_id,
        );
        tracing::info!("Super chat from '{}' to room {}", message.sender(), room_id);
        self.hub.broadcast(message).await?;

        Ok(())
    }
}
