//! UseCase errors.

use thiserror::Error;

use crate::{
    domain::{AuthError, ValueObjectError},
    hub::HubError,
};

/// Errors while joining a room
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("Invalid session token: {0}")]
    Unauthorized(#[from] AuthError),

    #[error(transparent)]
    HubStopped(#[from] HubError),
}

/// Errors while submitting a super chat
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuperChatError {
    /// Anonymous callers may not send
    #[error("Anonymous users cannot send super chats")]
    Anonymous,

    #[error("Invalid session token: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("Invalid message: {0}")]
    InvalidMessage(#[from] ValueObjectError),

    #[error(transparent)]
    HubStopped(#[from] HubError),
}
