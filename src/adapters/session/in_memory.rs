//! In-memory session store with per-entry expiry.
//!
//! Useful for tests and the console harness.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::adapters::{evict_expired, Expiring};
use crate::domain::foundation::UserId;
use crate::domain::registration::{SessionPatch, SessionState};
use crate::ports::{SessionStore, SessionStoreError};

#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<UserId, Expiring<SessionState>>>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Number of sessions that have not expired.
    pub async fn len(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|entry| !entry.is_expired())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<SessionState>, SessionStoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(user_id)
            .and_then(|entry| entry.live())
            .cloned())
    }

    async fn set(&self, user_id: &UserId, patch: SessionPatch) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        let mut state = sessions
            .remove(user_id)
            .and_then(Expiring::into_live)
            .unwrap_or_default();
        evict_expired(&mut *sessions);
        state.merge(patch);
        sessions.insert(user_id.clone(), Expiring::new(state, self.ttl));
        Ok(())
    }
}
