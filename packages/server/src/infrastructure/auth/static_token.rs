//! Session token lookup backed by a fixed token table.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{AuthError, Authenticator, DisplayName};

/// Authenticator with tokens supplied at startup
#[derive(Debug, Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, DisplayName>,
}

impl StaticTokenAuthenticator {
    pub fn new(entries: impl IntoIterator<Item = (String, DisplayName)>) -> Self {
        Self {
            tokens: entries.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<DisplayName, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
