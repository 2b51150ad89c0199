//! Redis-backed session store.
//!
//! Each session is one JSON document under `{prefix}:session:{user}`.
//! `set` reads, merges and writes the document back with a fresh TTL; no
//! lock is held between the read and the write.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

use crate::adapters::RedisKeys;
use crate::domain::foundation::UserId;
use crate::domain::registration::{SessionPatch, SessionState};
use crate::ports::{SessionStore, SessionStoreError};

#[derive(Clone)]
pub struct RedisSessionStore {
    conn: MultiplexedConnection,
    keys: RedisKeys,
    ttl: Duration,
}

impl RedisSessionStore {
    pub fn new(conn: MultiplexedConnection, keys: RedisKeys, ttl: Duration) -> Self {
        Self { conn, keys, ttl }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<SessionState>, SessionStoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(self.keys.session(user_id))
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::Unavailable(e.to_string()))?;

        raw.map(|json| {
            serde_json::from_str::<SessionState>(&json)
                .map_err(|e| SessionStoreError::Corrupt(e.to_string()))
        })
        .transpose()
    }

    async fn set(&self, user_id: &UserId, patch: SessionPatch) -> Result<(), SessionStoreError> {
        let mut state = self.get(user_id).await?.unwrap_or_default();
        state.merge(patch);

        let json = serde_json::to_string(&state)
            .map_err(|e| SessionStoreError::SerializationFailed(e.to_string()))?;

        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(self.keys.session(user_id), json, self.ttl.as_secs().max(1))
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::Unavailable(e.to_string()))?;

        tracing::trace!(user_id = %user_id, "Session stored");
        Ok(())
    }
}

impl std::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionStore")
            .field("keys", &self.keys)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
