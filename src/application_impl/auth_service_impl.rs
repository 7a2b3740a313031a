use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub struct RealAuthService {
    token_service: Arc<dyn TokenService>,
    session_store: Arc<dyn SessionStore>,
    user_directory: Arc<dyn UserDirectory>,
    keys: KeyMaterial,
    store_timeout: Duration,
}

impl RealAuthService {
    pub fn new(
        token_service: Arc<dyn TokenService>,
        session_store: Arc<dyn SessionStore>,
        user_directory: Arc<dyn UserDirectory>,
        keys: KeyMaterial,
        store_timeout: Duration,
    ) -> Self {
        Self {
            token_service,
            session_store,
            user_directory,
            keys,
            store_timeout,
        }
    }

    /// Run a collaborator call under the store deadline.
    async fn bounded<T, E>(&self, call: impl Future<Output = Result<T, E>>) -> Result<T, AuthError>
    where
        E: Into<AuthError>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result.map_err(|e| {
                let err = e.into();
                if let AuthError::Store(cause) = &err {
                    error!(tag = "session.store", error = %cause, "store call failed");
                }
                err
            }),
            Err(_) => {
                warn!(
                    tag = "session.timeout",
                    timeout_ms = self.store_timeout.as_millis() as u64,
                    "store call timed out"
                );
                Err(AuthError::StoreTimeout)
            }
        }
    }

    async fn open_session(&self, token: &Token) -> Result<(), AuthError> {
        self.bounded(
            self.session_store
                .set(token.token_id, &token.user_id, token.expires_at),
        )
        .await
    }

    /// Undo a half-opened login so no lone session outlives the failure.
    async fn roll_back(&self, token_id: TokenId) {
        if let Err(e) = self.bounded(self.session_store.del(&[token_id])).await {
            warn!(%token_id, error = %e, "rollback of access session failed");
        }
    }

    async fn live_owner(&self, token_id: TokenId) -> Result<User, AuthError> {
        let user_id = self
            .bounded(self.session_store.get(token_id))
            .await?
            .ok_or(AuthError::SessionRevoked)?;

        self.bounded(self.user_directory.find_by_id(&user_id))
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { email, password } = request;

        let user = self
            .bounded(self.user_directory.verify_credentials(&email, &password))
            .await?;

        let access_token = self.token_service.create_token(
            &user.id,
            self.keys.access.ttl,
            &self.keys.access.private_key,
        )?;
        let refresh_token = self.token_service.create_token(
            &user.id,
            self.keys.refresh.ttl,
            &self.keys.refresh.private_key,
        )?;

        self.open_session(&access_token).await?;
        if let Err(e) = self.open_session(&refresh_token).await {
            self.roll_back(access_token.token_id).await;
            return Err(e);
        }

        info!(
            user_id = %user.id,
            access_token_id = %access_token.token_id,
            refresh_token_id = %refresh_token.token_id,
            "login"
        );

        Ok(LoginResult {
            user,
            access_token,
            refresh_token,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResult, AuthError> {
        let details = self
            .token_service
            .validate_token(refresh_token, &self.keys.refresh.public_key)?;

        let user = self.live_owner(details.token_id).await?;

        let access_token = self.token_service.create_token(
            &user.id,
            self.keys.access.ttl,
            &self.keys.access.private_key,
        )?;
        self.open_session(&access_token).await?;

        debug!(
            user_id = %user.id,
            refresh_token_id = %details.token_id,
            access_token_id = %access_token.token_id,
            "access token refreshed"
        );

        Ok(RefreshResult { user, access_token })
    }

    async fn logout(&self, refresh_token: &str, session: &AuthContext) -> Result<(), AuthError> {
        let details = self
            .token_service
            .validate_token(refresh_token, &self.keys.refresh.public_key)?;

        if details.user_id != session.user.id {
            warn!(
                tag = "session.logout.owner",
                session_user = %session.user.id,
                refresh_user = %details.user_id,
                "refresh token belongs to another user"
            );
            return Err(AuthError::TokenInvalid);
        }

        let removed = self
            .bounded(
                self.session_store
                    .del(&[details.token_id, session.access_token_id]),
            )
            .await?;

        info!(user_id = %details.user_id, removed, "logout");
        Ok(())
    }

    async fn authenticate(&self, access_token: &str) -> Result<AuthContext, AuthError> {
        let details = self
            .token_service
            .validate_token(access_token, &self.keys.access.public_key)?;

        // The store record, not the token subject, decides who this is.
        let user = self.live_owner(details.token_id).await?;

        Ok(AuthContext {
            user,
            access_token_id: details.token_id,
        })
    }
}
