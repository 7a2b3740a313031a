use crate::domain_model::*;
use crate::domain_port::*;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use dashmap::DashMap;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password_hash: String,
}

/// Email-keyed account table holding argon2 PHC hashes.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    by_email: DashMap<String, Account>,
    by_id: DashMap<UserId, String>,
}

fn hash_password(password: &str) -> Result<String, UserDirectoryError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| UserDirectoryError::Store(e.to_string()))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, password_hash: &str) -> Result<bool, UserDirectoryError> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| UserDirectoryError::Store(format!("invalid PHC hash: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(UserDirectoryError::Store(format!("verify error: {e}"))),
    }
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, new_user: NewUser) -> Result<User, UserDirectoryError> {
        let email = new_user.email.trim().to_lowercase();
        if self.by_email.contains_key(&email) {
            return Err(UserDirectoryError::Store(format!(
                "email already registered: {email}"
            )));
        }

        let user = User {
            id: UserId(uuid::Uuid::new_v4().to_string()),
            name: new_user.name,
            email: email.clone(),
            role: new_user.role,
            created_at: Utc::now(),
        };
        let password_hash = hash_password(&new_user.password)?;

        self.by_id.insert(user.id.clone(), email.clone());
        self.by_email.insert(
            email,
            Account {
                user: user.clone(),
                password_hash,
            },
        );
        Ok(user)
    }

    pub fn remove_user(&self, user_id: &UserId) -> bool {
        match self.by_id.remove(user_id) {
            Some((_, email)) => self.by_email.remove(&email).is_some(),
            None => false,
        }
    }
}

#[async_trait::async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, UserDirectoryError> {
        let account = self
            .by_email
            .get(email)
            .map(|entry| entry.value().clone())
            .ok_or(UserDirectoryError::InvalidCredentials)?;

        let password = password.to_string();
        let password_hash = account.password_hash.clone();
        let ok = tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
            .await
            .map_err(|e| UserDirectoryError::Store(e.to_string()))??;

        if ok {
            Ok(account.user)
        } else {
            Err(UserDirectoryError::InvalidCredentials)
        }
    }

    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>, UserDirectoryError> {
        let Some(email) = self.by_id.get(user_id).map(|e| e.value().clone()) else {
            return Ok(None);
        };
        Ok(self.by_email.get(&email).map(|a| a.user.clone()))
    }
}
