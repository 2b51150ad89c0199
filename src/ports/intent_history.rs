//! Intent History Port - recent intents classified by the language model.
//!
//! The tool-selection layer appends to it; the engine clears it once a
//! record is created or deleted so stale intents do not leak into the next
//! registration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

#[derive(Debug, thiserror::Error)]
pub enum IntentHistoryError {
    #[error("Intent history unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to (de)serialize intent entry: {0}")]
    Serialization(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentEntry {
    pub intent: String,
    pub recorded_at: Timestamp,
}

impl IntentEntry {
    pub fn new(intent: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            recorded_at: Timestamp::now(),
        }
    }
}

#[async_trait]
pub trait IntentHistory: Send + Sync {
    async fn append(&self, user_id: &UserId, entry: IntentEntry) -> Result<(), IntentHistoryError>;

    /// The most recent `limit` entries, oldest first.
    async fn recent(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<IntentEntry>, IntentHistoryError>;

    async fn clear(&self, user_id: &UserId) -> Result<(), IntentHistoryError>;
}
