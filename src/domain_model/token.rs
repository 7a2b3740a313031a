use super::{User, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Time-ordered token identifier (UUID v7), also the session record key.
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub uuid::Uuid);

impl TokenId {
    pub fn new() -> Self {
        TokenId(uuid::Uuid::now_v7())
    }
}

impl Default for TokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TokenId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(TokenId)
    }
}

/// A signed credential. Immutable once minted.
#[derive(Debug, Clone)]
pub struct Token {
    pub token_id: TokenId,
    pub user_id: UserId,
    pub signed_value: String,
    pub expires_at: DateTime<Utc>,
}

/// Claims recovered from a signature-valid, unexpired token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDetails {
    pub token_id: TokenId,
    pub user_id: UserId,
}

/// Request-scoped context set once by the request gate.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    pub access_token_id: TokenId,
}
