use crate::config::CredentialEntry;
use crate::domain::ports::{Identity, IdentityVerifier};
use crate::error::{MarketError, Result};
use async_trait::async_trait;
use std::collections::HashMap;

/// Resolves bearer tokens against a fixed table, e.g. from configuration.
#[derive(Debug, Default, Clone)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, Identity>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, email: impl Into<String>) -> Self {
        let token = token.into();
        let email = email.into();
        self.tokens.insert(
            token,
            Identity {
                subject_id: format!("uid-{email}"),
                email,
            },
        );
        self
    }

    pub fn from_credentials(entries: &[CredentialEntry]) -> Self {
        entries.iter().fold(Self::new(), |verifier, entry| {
            verifier.with_token(entry.token.as_str(), entry.email.as_str())
        })
    }
}

#[async_trait]
impl IdentityVerifier for StaticTokenVerifier {
    async fn verify(&self, credential: &str) -> Result<Identity> {
        let token = credential
            .strip_prefix("Bearer ")
            .unwrap_or(credential)
            .trim();
        if token.is_empty() {
            return Err(MarketError::Unauthenticated("missing credential".to_string()));
        }
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| MarketError::Unauthenticated("invalid credential".to_string()))
    }
}
