use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, FromRedisValue, RedisResult, RedisWrite, ToRedisArgs, Value};
use std::time::Duration;

pub struct RedisSessionStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisSessionStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, token_id: TokenId) -> String {
        session_key(&self.prefix, token_id)
    }
}

fn session_key(prefix: &str, token_id: TokenId) -> String {
    format!("{}:{}", prefix, token_id)
}

/// PSETEX wants whole milliseconds, at least one.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

impl ToRedisArgs for UserId {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        out.write_arg(self.0.as_bytes())
    }
}

impl FromRedisValue for UserId {
    fn from_redis_value(v: &Value) -> RedisResult<Self> {
        let s: String = redis::from_redis_value(v)?;
        Ok(UserId(s))
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn set(
        &self,
        token_id: TokenId,
        user_id: &UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionStoreError> {
        let ttl = remaining_ttl(expires_at).ok_or(SessionStoreError::Expired)?;
        let ttl_ms = ttl_millis(ttl);

        let key = self.key(token_id);
        let mut conn = self.conn.clone();
        let _: () = conn
            .pset_ex(&key, user_id, ttl_ms)
            .await
            .map_err(|e| SessionStoreError::Store(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, token_id: TokenId) -> Result<Option<UserId>, SessionStoreError> {
        let key = self.key(token_id);
        let mut conn = self.conn.clone();
        let val: Option<UserId> = conn
            .get(&key)
            .await
            .map_err(|e| SessionStoreError::Store(e.to_string()))?;
        Ok(val)
    }

    async fn del(&self, token_ids: &[TokenId]) -> Result<usize, SessionStoreError> {
        if token_ids.is_empty() {
            return Ok(0);
        }
        let keys: Vec<String> = token_ids.iter().map(|id| self.key(*id)).collect();
        let mut conn = self.conn.clone();
        let removed: usize = conn
            .del(&keys)
            .await
            .map_err(|e| SessionStoreError::Store(e.to_string()))?;
        Ok(removed)
    }
}
