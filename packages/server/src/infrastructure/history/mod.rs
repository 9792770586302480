//! History Store の実装
//!
//! - `inmemory`: プロセス内に保持する実装（保持件数・保持期間を設定可能）

pub mod inmemory;

pub use inmemory::{InMemoryHistoryStore, RetentionPolicy};
