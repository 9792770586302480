//! Domain layer
//!
//! ルーム・クライアント・メッセージの値オブジェクトとエンティティ、
//! および Hub が依存する外部ケイパビリティ（履歴ストア、認証、強制切断）の
//! trait を定義します。具体的な実装は Infrastructure 層が提供します。

mod auth;
mod connection;
pub mod entity;
mod error;
mod history;
pub mod value_object;

pub use auth::Authenticator;
pub use connection::{CloseReason, ConnectionCloser};
pub use entity::{Message, RoomSummary};
pub use error::{AuthError, HistoryError, ValueObjectError};
pub use history::HistoryStore;
#[cfg(test)]
pub use history::MockHistoryStore;
pub use value_object::{
    ANONYMOUS_DISPLAY_NAME, ClientId, DisplayName, Identity, MessageKind, Payload, RoomId,
    Timestamp,
};
