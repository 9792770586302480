//! UseCase: ルーム参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::identify() と execute()
//!
//! ### なぜこのテストが必要か
//! - セッショントークンの有無で送信可能なメンバーか受信専用かが決まる
//! - 不正なトークンは接続前に拒否しなければならない
//!
//! ### どのような状況を想定しているか
//! - 正常系：有効なトークン、トークンなし（匿名）
//! - 異常系：不正なトークン、停止した Hub

use std::sync::Arc;

use crate::{
    domain::{Authenticator, ConnectionCloser, Identity, RoomId},
    hub::{Client, ClientTicket, Hub, OutboundQueue},
};

use super::error::JoinError;

/// A client handed over to the hub, as seen from its connection
#[derive(Debug)]
pub struct JoinedClient {
    pub ticket: ClientTicket,
    pub queue: OutboundQueue,
}

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    hub: Hub,
    authenticator: Arc<dyn Authenticator>,
    /// Outbound queue capacity of each new client
    queue_capacity: usize,
}

impl JoinRoomUseCase {
    pub fn new(hub: Hub, authenticator: Arc<dyn Authenticator>, queue_capacity: usize) -> Self {
        Self {
            hub,
            authenticator,
            queue_capacity,
        }
    }

    /// Resolve who is connecting.
    ///
    /// A missing or blank token means an anonymous, receive-only member.
    pub async fn identify(&self, session_token: Option<&str>) -> Result<Identity, JoinError> {
        match session_token.map(str::trim) {
            None | Some("") => Ok(Identity::Anonymous),
            Some(token) => {
                let name = self.authenticator.authenticate(token).await?;
                Ok(Identity::Member(name))
            }
        }
    }

    /// Create the client and register it with the hub.
    ///
    /// # Arguments
    ///
    /// * `closer` - Used by the hub to force-close this connection
    pub fn execute(
        &self,
        identity: Identity,
        room_id: RoomId,
        closer: Arc<dyn ConnectionCloser>,
    ) -> Result<JoinedClient, JoinError> {
        let (client, queue) = Client::new(identity, room_id, self.queue_capacity, closer);
        let ticket = self.hub.register(client)?;
        tracing::debug!("Client '{}' registered for room {}", ticket.id, room_id);

        Ok(JoinedClient { ticket, queue })
    }
}
