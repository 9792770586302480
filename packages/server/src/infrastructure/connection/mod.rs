//! Connection pump
//!
//! 1 接続につき 2 つのループ（受信ループと送信ループ）を動かし、
//! WebSocket と Hub の間でメッセージを中継します。
//!
//! - `closer`: Hub からの強制切断要求を接続側に伝えるシグナル
//! - `pump`: 受信ループ・送信ループと、その終了シーケンス

pub mod closer;
pub mod pump;

pub use closer::{CloseWatch, WebSocketCloser, close_signal};
pub use pump::{ConnectionPump, OutboundOutcome, PumpConfig};
