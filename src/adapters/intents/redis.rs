//! Redis-backed intent history: a capped list per user.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

use crate::adapters::RedisKeys;
use crate::domain::foundation::UserId;
use crate::ports::{IntentEntry, IntentHistory, IntentHistoryError};

#[derive(Clone)]
pub struct RedisIntentHistory {
    conn: MultiplexedConnection,
    keys: RedisKeys,
    max_entries: usize,
    ttl: Duration,
}

impl RedisIntentHistory {
    pub fn new(
        conn: MultiplexedConnection,
        keys: RedisKeys,
        max_entries: usize,
        ttl: Duration,
    ) -> Self {
        Self {
            conn,
            keys,
            max_entries: max_entries.max(1),
            ttl,
        }
    }
}

fn unavailable(e: redis::RedisError) -> IntentHistoryError {
    IntentHistoryError::Unavailable(e.to_string())
}

#[async_trait]
impl IntentHistory for RedisIntentHistory {
    async fn append(&self, user_id: &UserId, entry: IntentEntry) -> Result<(), IntentHistoryError> {
        let key = self.keys.intents(user_id);
        let json = serde_json::to_string(&entry)
            .map_err(|e| IntentHistoryError::Serialization(e.to_string()))?;

        let mut conn = self.conn.clone();
        conn.rpush::<_, _, ()>(&key, json).await.map_err(unavailable)?;
        conn.ltrim::<_, ()>(&key, -(self.max_entries as isize), -1)
            .await
            .map_err(unavailable)?;
        conn.expire::<_, ()>(&key, self.ttl.as_secs().max(1) as i64)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn recent(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<IntentEntry>, IntentHistoryError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let raw: Vec<String> = conn
            .lrange(self.keys.intents(user_id), -(limit as isize), -1)
            .await
            .map_err(unavailable)?;

        raw.iter()
            .map(|json| {
                serde_json::from_str(json)
                    .map_err(|e| IntentHistoryError::Serialization(e.to_string()))
            })
            .collect()
    }

    async fn clear(&self, user_id: &UserId) -> Result<(), IntentHistoryError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.keys.intents(user_id))
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisIntentHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisIntentHistory")
            .field("keys", &self.keys)
            .field("max_entries", &self.max_entries)
            .finish_non_exhaustive()
    }
}
