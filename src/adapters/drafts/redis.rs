//! Redis-backed draft store: one JSON value per user and flow, with a TTL.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde_json::Value;
use std::time::Duration;

use crate::adapters::RedisKeys;
use crate::domain::foundation::UserId;
use crate::domain::registration::FlowType;
use crate::ports::{DraftStore, DraftStoreError};

#[derive(Clone)]
pub struct RedisDraftStore {
    conn: MultiplexedConnection,
    keys: RedisKeys,
    ttl: Duration,
}

impl RedisDraftStore {
    pub fn new(conn: MultiplexedConnection, keys: RedisKeys, ttl: Duration) -> Self {
        Self { conn, keys, ttl }
    }
}

#[async_trait]
impl DraftStore for RedisDraftStore {
    async fn load(
        &self,
        user_id: &UserId,
        flow_type: FlowType,
    ) -> Result<Option<Value>, DraftStoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(self.keys.draft(flow_type, user_id))
            .await
            .map_err(|e: redis::RedisError| DraftStoreError::Unavailable(e.to_string()))?;

        raw.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| DraftStoreError::DeserializationFailed(e.to_string()))
        })
        .transpose()
    }

    async fn save(
        &self,
        user_id: &UserId,
        flow_type: FlowType,
        draft: &Value,
    ) -> Result<(), DraftStoreError> {
        let json = serde_json::to_string(draft)
            .map_err(|e| DraftStoreError::SerializationFailed(e.to_string()))?;

        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(
            self.keys.draft(flow_type, user_id),
            json,
            self.ttl.as_secs().max(1),
        )
        .await
        .map_err(|e: redis::RedisError| DraftStoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn clear(&self, user_id: &UserId, flow_type: FlowType) -> Result<(), DraftStoreError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.keys.draft(flow_type, user_id))
            .await
            .map_err(|e: redis::RedisError| DraftStoreError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisDraftStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisDraftStore")
            .field("keys", &self.keys)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
