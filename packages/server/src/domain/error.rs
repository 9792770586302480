//! Domain error types.

use thiserror::Error;

/// Errors raised when constructing value objects from external input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// Room identifiers are externally assigned positive integers
    #[error("Invalid room id: {0}")]
    InvalidRoomId(i64),

    #[error("Display name must not be empty")]
    EmptyDisplayName,

    #[error("Display name is too long ({len} > {max} characters)")]
    DisplayNameTooLong { len: usize, max: usize },

    #[error("Message payload must not be empty")]
    EmptyPayload,

    #[error("Message payload is too large ({len} > {max} bytes)")]
    PayloadTooLarge { len: usize, max: usize },
}

/// History store failures
///
/// These are never fatal for the hub: a failed append is logged and a failed
/// fetch is treated as "no history available".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("History store unavailable: {0}")]
    Unavailable(String),
}

/// Session token authentication failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Session token must not be empty")]
    EmptyToken,

    #[error("Invalid session token")]
    InvalidToken,
}
