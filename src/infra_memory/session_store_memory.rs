use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::time::Instant;

/// Process-local session store. Deadlines follow the tokio clock.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    records: DashMap<TokenId, (UserId, Instant)>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every record past its deadline, returning how many went.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.records.len();
        self.records.retain(|_, (_, deadline)| *deadline > now);
        before.saturating_sub(self.records.len())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn set(
        &self,
        token_id: TokenId,
        user_id: &UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionStoreError> {
        let ttl = remaining_ttl(expires_at).ok_or(SessionStoreError::Expired)?;
        self.records
            .insert(token_id, (user_id.clone(), Instant::now() + ttl));
        Ok(())
    }

    async fn get(&self, token_id: TokenId) -> Result<Option<UserId>, SessionStoreError> {
        let now = Instant::now();
        let live = self
            .records
            .get(&token_id)
            .map(|entry| (entry.0.clone(), entry.1 > now));

        match live {
            Some((user_id, true)) => Ok(Some(user_id)),
            Some((_, false)) => {
                self.records.remove_if(&token_id, |_, (_, deadline)| *deadline <= now);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn del(&self, token_ids: &[TokenId]) -> Result<usize, SessionStoreError> {
        let now = Instant::now();
        let removed = token_ids
            .iter()
            .filter_map(|id| self.records.remove(id))
            .filter(|(_, (_, deadline))| *deadline > now)
            .count();
        Ok(removed)
    }
}
