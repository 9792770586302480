//! UseCase layer
//!
//! HTTP / WebSocket ハンドラから呼ばれるアプリケーションロジック。
//! 認証と値オブジェクトへの変換を済ませてから Hub に依頼します。

mod error;
mod join_room;
mod list_rooms;
mod super_chat;

pub use error::{JoinError, SuperChatError};
pub use join_room::{JoinRoomUseCase, JoinedClient};
pub use list_rooms::ListRoomsUseCase;
pub use super_chat::SuperChatUseCase;
