//! Record API Port - the external backing store of registered records.
//!
//! The API only has to hand back an id on create; payload shapes belong to
//! each domain.

use async_trait::async_trait;

use crate::domain::foundation::{RecordId, UserId};
use crate::domain::registration::{FlowType, ServiceError};

#[derive(Debug, thiserror::Error)]
pub enum RecordApiError {
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    #[error("Record API rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Record API unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected record API response: {0}")]
    InvalidResponse(String),
}

impl From<RecordApiError> for ServiceError {
    fn from(err: RecordApiError) -> Self {
        match err {
            RecordApiError::NotFound(id) => ServiceError::NotFound(id.to_string()),
            RecordApiError::Unavailable(message) => ServiceError::Unavailable(message),
            other => ServiceError::RecordApi(other.to_string()),
        }
    }
}

#[async_trait]
pub trait RecordApi: Send + Sync {
    async fn create(
        &self,
        flow_type: FlowType,
        user_id: &UserId,
        payload: &serde_json::Value,
    ) -> Result<RecordId, RecordApiError>;

    async fn update(
        &self,
        flow_type: FlowType,
        user_id: &UserId,
        record_id: &RecordId,
        payload: &serde_json::Value,
    ) -> Result<(), RecordApiError>;

    async fn delete(
        &self,
        flow_type: FlowType,
        user_id: &UserId,
        record_id: &RecordId,
    ) -> Result<(), RecordApiError>;
}
