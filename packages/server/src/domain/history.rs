//! History Store trait 定義
//!
//! ルームごとの直近メッセージを保持する外部ストアへのインターフェース。
//! Hub はバックエンド（インメモリ、KV リスト、RDB）に依存しません。

use std::sync::Arc;

use async_trait::async_trait;

use super::{HistoryError, Message, RoomId};

/// Append-only per-room message log with bounded retention
///
/// Retention (count, time-to-live, or both) is a property of the
/// implementation. Appends for one room must be returned by `recent` in the
/// order they were made.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// メッセージを履歴に追加
    async fn append(&self, room_id: RoomId, message: Arc<Message>) -> Result<(), HistoryError>;

    /// 直近のメッセージを古い順に取得
    async fn recent(&self, room_id: RoomId) -> Result<Vec<Arc<Message>>, HistoryError>;
}
