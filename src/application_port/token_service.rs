use crate::domain_model::*;
use std::fmt;
use std::time::Duration;

/// Key pair and lifetimes for one token class. Keys are base64-encoded PEM.
#[derive(Clone)]
pub struct TokenKeys {
    pub private_key: String,
    pub public_key: String,
    pub ttl: Duration,
    pub max_age: Duration,
}

impl fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKeys")
            .field("private_key", &"<redacted>")
            .field("public_key", &"<redacted>")
            .field("ttl", &self.ttl)
            .field("max_age", &self.max_age)
            .finish()
    }
}

/// Read-only after startup.
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    pub access: TokenKeys,
    pub refresh: TokenKeys,
}

/// Opaque on purpose: the cause is logged, never returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("could not create token")]
    Creation,
    #[error("please log in again")]
    Validation,
}

pub trait TokenService: Send + Sync {
    fn create_token(
        &self,
        user_id: &UserId,
        ttl: Duration,
        private_key: &str,
    ) -> Result<Token, TokenError>;

    fn validate_token(
        &self,
        signed_value: &str,
        public_key: &str,
    ) -> Result<TokenDetails, TokenError>;
}
