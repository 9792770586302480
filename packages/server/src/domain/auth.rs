//! Authenticator trait 定義

use async_trait::async_trait;

use super::{AuthError, DisplayName};

/// Resolves a session token to the display name of its owner
///
/// Token issuance (login) happens elsewhere; the relay only looks tokens up.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<DisplayName, AuthError>;
}
