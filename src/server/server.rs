use crate::api::v1::CookiePolicy;
use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::UserId;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub cookie_policy: Arc<CookiePolicy>,
    sweeper_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let token_service: Arc<dyn TokenService> = Arc::new(RsaJwtTokenService::new());
        let keys = KeyMaterial {
            access: TokenKeys::from(&settings.token.access),
            refresh: TokenKeys::from(&settings.token.refresh),
        };
        check_key_pair(token_service.as_ref(), &keys.access, "access")?;
        check_key_pair(token_service.as_ref(), &keys.refresh, "refresh")?;

        let mut sweeper_handle = None;
        let session_store: Arc<dyn SessionStore> = match settings.session.backend.as_str() {
            "redis" => {
                let dsn = settings
                    .session
                    .redis_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("session.redis_dsn is required for redis"))?;
                let redis_client = redis::Client::open(dsn)?;
                let redis_manager = redis_client.get_connection_manager().await?;
                Arc::new(RedisSessionStore::new(
                    redis_manager,
                    settings.session.prefix.clone(),
                ))
            }
            "memory" => {
                let store = Arc::new(InMemorySessionStore::new());
                let interval = Duration::from_secs(settings.session.sweep_interval_secs.max(1));
                sweeper_handle = Some(spawn_sweeper(store.clone(), interval));
                store
            }
            other => return Err(anyhow::anyhow!("Unknown session backend: {}", other)),
        };

        let user_directory: Arc<dyn UserDirectory> = match settings.user.backend.as_str() {
            "memory" => {
                let directory = InMemoryUserDirectory::new();
                for seed in &settings.user.seed {
                    let user = directory.add_user(NewUser {
                        name: seed.name.clone(),
                        email: seed.email.clone(),
                        password: seed.password.clone(),
                        role: seed.role.clone(),
                    })?;
                    info!(user_id = %user.id, email = %user.email, "seeded user");
                }
                Arc::new(directory)
            }
            other => return Err(anyhow::anyhow!("Unknown user backend: {}", other)),
        };

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            token_service,
            session_store,
            user_directory,
            keys.clone(),
            Duration::from_millis(settings.session.store_timeout_ms),
        ));

        let cookie_policy = Arc::new(CookiePolicy {
            domain: settings.cookie.domain.clone(),
            path: settings.cookie.path.clone(),
            secure: settings.cookie.secure,
            http_only: settings.cookie.http_only,
            access_max_age: keys.access.max_age,
            refresh_max_age: keys.refresh.max_age,
        });

        info!(backend = %settings.session.backend, "server started");

        Ok(Self {
            auth_service,
            cookie_policy,
            sweeper_handle: Mutex::new(sweeper_handle),
        })
    }

    /// Assemble a server from ready-made collaborators.
    pub fn from_parts(auth_service: Arc<dyn AuthService>, cookie_policy: CookiePolicy) -> Self {
        Self {
            auth_service,
            cookie_policy: Arc::new(cookie_policy),
            sweeper_handle: Mutex::new(None),
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        let handle = match self.sweeper_handle.lock() {
            Ok(mut lock) => lock.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            handle.abort();
            let r = handle.await;
            info!(cancelled = r.is_err(), "sweeper stopped");
        }
    }
}

/// Fail startup early when a key pair cannot mint and verify a token.
fn check_key_pair(
    token_service: &dyn TokenService,
    keys: &TokenKeys,
    class: &str,
) -> anyhow::Result<()> {
    if keys.ttl.is_zero() {
        return Err(anyhow::anyhow!("{} token lifetime must be positive", class));
    }
    let probe = token_service
        .create_token(&UserId::from("startup-check"), keys.ttl, &keys.private_key)
        .map_err(|e| anyhow::anyhow!("{} private key unusable: {}", class, e))?;
    token_service
        .validate_token(&probe.signed_value, &keys.public_key)
        .map_err(|_| anyhow::anyhow!("{} public key does not match its private key", class))?;
    Ok(())
}

fn spawn_sweeper(store: Arc<InMemorySessionStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let purged = store.purge_expired();
            if purged > 0 {
                debug!(purged, remaining = store.len(), "expired sessions purged");
            }
        }
    })
}
