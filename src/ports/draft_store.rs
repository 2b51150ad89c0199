//! Draft Store Port - persisted partial records.
//!
//! Drafts are keyed by user and flow type and stored as JSON documents; the
//! typed view lives in `application::flows::DraftRepository`.

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::domain::registration::{FlowType, ServiceError};

#[derive(Debug, thiserror::Error)]
pub enum DraftStoreError {
    #[error("Draft store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to serialize draft: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize draft: {0}")]
    DeserializationFailed(String),
}

impl From<DraftStoreError> for ServiceError {
    fn from(err: DraftStoreError) -> Self {
        ServiceError::Storage(err.to_string())
    }
}

#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Loads the draft, `None` when absent or expired.
    async fn load(
        &self,
        user_id: &UserId,
        flow_type: FlowType,
    ) -> Result<Option<serde_json::Value>, DraftStoreError>;

    /// Replaces the draft and refreshes its TTL.
    async fn save(
        &self,
        user_id: &UserId,
        flow_type: FlowType,
        draft: &serde_json::Value,
    ) -> Result<(), DraftStoreError>;

    /// Removes the draft. Clearing an absent draft succeeds.
    async fn clear(&self, user_id: &UserId, flow_type: FlowType) -> Result<(), DraftStoreError>;
}
