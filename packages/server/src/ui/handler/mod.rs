//! Request handlers.

mod error;
mod http;
mod websocket;

pub use http::{health_check, list_rooms, super_chat};
pub use websocket::websocket_handler;
