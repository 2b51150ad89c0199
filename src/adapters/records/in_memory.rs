//! In-memory record API.
//!
//! Assigns ids `rec-1`, `rec-2`, ... and can be told to fail each kind of
//! call, which is how the engine's recovery paths are exercised.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{RecordId, UserId};
use crate::domain::registration::FlowType;
use crate::ports::{RecordApi, RecordApiError};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub flow_type: FlowType,
    pub user_id: UserId,
    pub payload: Value,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordApi {
    records: Arc<RwLock<HashMap<RecordId, StoredRecord>>>,
    next_id: Arc<AtomicU64>,
    fail_create: Arc<AtomicBool>,
    fail_update: Arc<AtomicBool>,
    fail_delete: Arc<AtomicBool>,
}

impl InMemoryRecordApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_creates(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub async fn get(&self, record_id: &RecordId) -> Option<StoredRecord> {
        self.records.read().await.get(record_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn rejected(operation: &str) -> RecordApiError {
        RecordApiError::Rejected {
            status: 503,
            message: format!("{} disabled for this test", operation),
        }
    }
}

#[async_trait]
impl RecordApi for InMemoryRecordApi {
    async fn create(
        &self,
        flow_type: FlowType,
        user_id: &UserId,
        payload: &Value,
    ) -> Result<RecordId, RecordApiError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Self::rejected("create"));
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record_id = RecordId::new(format!("rec-{}", n))
            .map_err(|e| RecordApiError::InvalidResponse(e.to_string()))?;

        self.records.write().await.insert(
            record_id.clone(),
            StoredRecord {
                flow_type,
                user_id: user_id.clone(),
                payload: payload.clone(),
            },
        );
        Ok(record_id)
    }

    async fn update(
        &self,
        _flow_type: FlowType,
        _user_id: &UserId,
        record_id: &RecordId,
        payload: &Value,
    ) -> Result<(), RecordApiError> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(Self::rejected("update"));
        }
        let mut records = self.records.write().await;
        let record = records
            .get_mut(record_id)
            .ok_or_else(|| RecordApiError::NotFound(record_id.clone()))?;
        record.payload = payload.clone();
        Ok(())
    }

    async fn delete(
        &self,
        _flow_type: FlowType,
        _user_id: &UserId,
        record_id: &RecordId,
    ) -> Result<(), RecordApiError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Self::rejected("delete"));
        }
        self.records
            .write()
            .await
            .remove(record_id)
            .map(|_| ())
            .ok_or_else(|| RecordApiError::NotFound(record_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user() -> UserId {
        UserId::new("5511999990000").unwrap()
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let api = InMemoryRecordApi::new();
        let first = api.create(FlowType::Death, &user(), &json!({})).await.unwrap();
        let second = api.create(FlowType::Death, &user(), &json!({})).await.unwrap();

        assert_eq!(first.as_str(), "rec-1");
        assert_eq!(second.as_str(), "rec-2");
    }

    #[tokio::test]
    async fn update_replaces_payload() {
        let api = InMemoryRecordApi::new();
        let id = api
            .create(FlowType::Expense, &user(), &json!({"value": 10.0}))
            .await
            .unwrap();
        api.update(FlowType::Expense, &user(), &id, &json!({"value": 12.5}))
            .await
            .unwrap();

        assert_eq!(api.get(&id).await.unwrap().payload, json!({"value": 12.5}));
    }

    #[tokio::test]
    async fn unknown_record_is_not_found() {
        let api = InMemoryRecordApi::new();
        let id = RecordId::new("rec-404").unwrap();
        let err = api.delete(FlowType::Death, &user(), &id).await.unwrap_err();
        assert!(matches!(err, RecordApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn injected_failures_reject_calls() {
        let api = InMemoryRecordApi::new();
        api.fail_creates(true);
        assert!(api.create(FlowType::Death, &user(), &json!({})).await.is_err());
        assert!(api.is_empty().await);
    }
}
