//! Infrastructure layer
//!
//! ドメイン層が定義する trait の具体的な実装と、WebSocket 接続の入出力を
//! 担うコネクションポンプ、ワイヤーフォーマットの DTO を提供します。

pub mod auth;
pub mod connection;
pub mod dto;
pub mod history;
