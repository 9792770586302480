//! Authenticator の実装
//!
//! - `static_token`: 設定で与えたトークン表を引く実装

pub mod static_token;

pub use static_token::StaticTokenAuthenticator;
