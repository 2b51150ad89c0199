//! Domain Service Port - per-flow draft handling and record CRUD.
//!
//! One implementation exists per flow type. The engine relies only on:
//! - loads are idempotent and return an empty draft when none is stored
//! - `has_missing_fields` is deterministic and ordered by asking priority
//! - `create` returns the id assigned by the record API, and `update`
//!   never drops it

use async_trait::async_trait;

use crate::domain::foundation::{RecordId, UserId};
use crate::domain::registration::{FieldName, FieldUpdates, FlowDraft, FlowType, ServiceError};

#[async_trait]
pub trait DomainService: Send + Sync + 'static {
    type Field: FieldName;
    type Draft: FlowDraft;

    fn flow_type(&self) -> FlowType;

    async fn load_draft(&self, user_id: &UserId) -> Result<Self::Draft, ServiceError>;

    async fn save_draft(&self, user_id: &UserId, draft: &Self::Draft) -> Result<(), ServiceError>;

    async fn clear_draft(&self, user_id: &UserId) -> Result<(), ServiceError>;

    /// Validates and merges `updates` into the stored draft, returning the result.
    async fn update_draft(
        &self,
        user_id: &UserId,
        updates: &FieldUpdates<Self::Field>,
    ) -> Result<Self::Draft, ServiceError>;

    /// Required fields still unset, in the order they should be asked.
    fn has_missing_fields(&self, draft: &Self::Draft) -> Vec<Self::Field>;

    fn build_draft_summary(&self, draft: &Self::Draft) -> String;

    /// Optional natural-language summary; `None` falls back to
    /// [`DomainService::build_draft_summary`].
    async fn build_natural_summary(&self, _draft: &Self::Draft) -> Option<String> {
        None
    }

    async fn create(&self, user_id: &UserId, draft: &Self::Draft) -> Result<RecordId, ServiceError>;

    async fn update(
        &self,
        user_id: &UserId,
        record_id: &RecordId,
        draft: &Self::Draft,
        updates: &FieldUpdates<Self::Field>,
    ) -> Result<(), ServiceError>;

    async fn delete(&self, user_id: &UserId, record_id: &RecordId) -> Result<(), ServiceError>;

    /// Whether `field_name` names a field the user may change.
    fn is_field_valid(&self, field_name: &str) -> bool {
        Self::Field::parse(field_name).is_some()
    }

    /// Bulleted list of the fields the user may change.
    fn valid_fields_formatted(&self) -> String {
        Self::Field::ALL
            .iter()
            .filter(|field| self.is_field_valid(field.as_str()))
            .map(|field| format!("• {}", field.label()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn handle_service_error(&self, err: &ServiceError) -> String {
        err.user_message()
    }
}
