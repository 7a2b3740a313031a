use crate::application_port::TokenKeys;
use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub cookie: Cookie,
    pub http: Http,
    pub log: Log,
    pub session: Session,
    pub token: Token,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cookie {
    pub domain: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>, // TLS only when both paths are set
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Deserialize)]
pub struct Session {
    pub backend: String, // "redis" or "memory"
    pub redis_dsn: Option<String>,
    pub prefix: String,
    pub store_timeout_ms: u64,
    pub sweep_interval_secs: u64,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("backend", &self.backend)
            .field("redis_dsn", &self.redis_dsn.as_ref().map(|_| "<redacted>"))
            .field("prefix", &self.prefix)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .field("sweep_interval_secs", &self.sweep_interval_secs)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct Token {
    pub access: TokenClass,
    pub refresh: TokenClass,
}

#[derive(Deserialize)]
pub struct TokenClass {
    pub private_key: String, // base64 PEM
    pub public_key: String,  // base64 PEM
    pub expires_in_secs: u64,
    pub max_age_secs: u64,
}

impl fmt::Debug for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenClass")
            .field("expires_in_secs", &self.expires_in_secs)
            .field("max_age_secs", &self.max_age_secs)
            .finish_non_exhaustive()
    }
}

impl From<&TokenClass> for TokenKeys {
    fn from(class: &TokenClass) -> Self {
        TokenKeys {
            private_key: class.private_key.clone(),
            public_key: class.public_key.clone(),
            ttl: Duration::from_secs(class.expires_in_secs),
            max_age: Duration::from_secs(class.max_age_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub backend: String, // "memory"
    #[serde(default)]
    pub seed: Vec<SeedUser>,
}

#[derive(Deserialize)]
pub struct SeedUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "user".to_string()
}

impl fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

const ENV_PREFIX: &str = "TOKENGATE";

/// File settings, overridden by `TOKENGATE__SECTION__KEY` variables.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_settings_parse() {
        let settings = parse_settings(Some("settings/dev.toml")).unwrap();
        assert_eq!(settings.session.backend, "memory");
        assert_eq!(settings.cookie.path, "/");
        assert!(settings.token.access.expires_in_secs < settings.token.refresh.expires_in_secs);

        let keys = TokenKeys::from(&settings.token.access);
        assert_eq!(keys.ttl, Duration::from_secs(settings.token.access.expires_in_secs));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(parse_settings(Some("settings/does-not-exist.toml")).is_err());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let settings = parse_settings(Some("settings/dev.toml")).unwrap();
        let printed = format!("{:?}", settings);
        assert!(!printed.contains(&settings.token.access.private_key));
        for seed in &settings.user.seed {
            assert!(!printed.contains(&format!("password: {:?}", seed.password)));
        }
    }

    #[test]
    fn debug_output_hides_redis_credentials() {
        let session = Session {
            backend: "redis".into(),
            redis_dsn: Some("redis://:s3cret@cache.internal:6379/0".into()),
            prefix: "tokengate:session".into(),
            store_timeout_ms: 500,
            sweep_interval_secs: 60,
        };
        let printed = format!("{:?}", session);
        assert!(!printed.contains("s3cret"));
        assert!(!printed.contains("cache.internal"));
        assert!(printed.contains("redis_dsn: Some(\"<redacted>\")"));
    }
}
