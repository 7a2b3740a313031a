use super::TokenError;
use crate::domain_model::*;
use crate::domain_port::*;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("no token presented")]
    NotLoggedIn,
    #[error("token invalid")]
    TokenInvalid,
    #[error("session revoked or expired")]
    SessionRevoked,
    #[error("user not found")]
    UserNotFound,
    #[error("token creation failed")]
    TokenCreation,
    #[error("store error: {0}")]
    Store(String),
    #[error("store deadline elapsed")]
    StoreTimeout,
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Creation => AuthError::TokenCreation,
            TokenError::Validation => AuthError::TokenInvalid,
        }
    }
}

impl From<SessionStoreError> for AuthError {
    fn from(err: SessionStoreError) -> Self {
        AuthError::Store(err.to_string())
    }
}

impl From<UserDirectoryError> for AuthError {
    fn from(err: UserDirectoryError) -> Self {
        match err {
            UserDirectoryError::InvalidCredentials => AuthError::InvalidCredentials,
            UserDirectoryError::Store(e) => AuthError::Store(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: User,
    pub access_token: Token,
    pub refresh_token: Token,
}

#[derive(Debug, Clone)]
pub struct RefreshResult {
    pub user: User,
    pub access_token: Token,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verify credentials and open an access/refresh session pair.
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;

    /// Mint a new access token from a live refresh token. The refresh token is
    /// not rotated.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResult, AuthError>;

    /// Revoke both sessions of a login. The refresh token must belong to the
    /// same user as the gated access session.
    async fn logout(&self, refresh_token: &str, session: &AuthContext) -> Result<(), AuthError>;

    /// Turn a raw access token into an authenticated request context.
    async fn authenticate(&self, access_token: &str) -> Result<AuthContext, AuthError>;
}
