use crate::domain_model::*;
use chrono::{DateTime, Utc};

/// Revocation authority: one record per issued token, keyed by token id.
///
/// A missing record means the token is either naturally expired or revoked;
/// callers treat both the same way. Infrastructure failures are reported as
/// errors and must never be confused with a miss.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Store `token_id -> user_id` until `expires_at`.
    async fn set(
        &self,
        token_id: TokenId,
        user_id: &UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionStoreError>;

    /// Owner of a live record, or `None` when absent.
    async fn get(&self, token_id: TokenId) -> Result<Option<UserId>, SessionStoreError>;

    /// Delete every given record in one call, returning how many existed.
    async fn del(&self, token_ids: &[TokenId]) -> Result<usize, SessionStoreError>;
}

/// Time left until `expires_at`, or `None` once it has passed.
pub fn remaining_ttl(expires_at: DateTime<Utc>) -> Option<std::time::Duration> {
    (expires_at - Utc::now())
        .to_std()
        .ok()
        .filter(|ttl| !ttl.is_zero())
}

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session already expired")]
    Expired,
    #[error("infra error: {0}")]
    Store(String),
}
