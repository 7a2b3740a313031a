use crate::domain_model::*;

/// Account lookup owned by the surrounding application.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Check an email/password pair. Unknown emails and wrong passwords are
    /// both reported as `InvalidCredentials`.
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, UserDirectoryError>;

    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>, UserDirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum UserDirectoryError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("store error: {0}")]
    Store(String),
}
