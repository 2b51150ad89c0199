//! In-memory draft store.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::adapters::{evict_expired, Expiring};
use crate::domain::foundation::UserId;
use crate::domain::registration::FlowType;
use crate::ports::{DraftStore, DraftStoreError};

#[derive(Debug, Clone)]
pub struct InMemoryDraftStore {
    drafts: Arc<RwLock<HashMap<(UserId, FlowType), Expiring<Value>>>>,
    ttl: Duration,
}

impl InMemoryDraftStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            drafts: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Whether a live draft exists (useful for tests)
    pub async fn contains(&self, user_id: &UserId, flow_type: FlowType) -> bool {
        self.drafts
            .read()
            .await
            .get(&(user_id.clone(), flow_type))
            .is_some_and(|entry| !entry.is_expired())
    }
}

#[async_trait]
impl DraftStore for InMemoryDraftStore {
    async fn load(
        &self,
        user_id: &UserId,
        flow_type: FlowType,
    ) -> Result<Option<Value>, DraftStoreError> {
        let drafts = self.drafts.read().await;
        Ok(drafts
            .get(&(user_id.clone(), flow_type))
            .and_then(|entry| entry.live())
            .cloned())
    }

    async fn save(
        &self,
        user_id: &UserId,
        flow_type: FlowType,
        draft: &Value,
    ) -> Result<(), DraftStoreError> {
        let mut drafts = self.drafts.write().await;
        evict_expired(&mut *drafts);
        drafts.insert((user_id.clone(), flow_type), Expiring::new(draft.clone(), self.ttl));
        Ok(())
    }

    async fn clear(&self, user_id: &UserId, flow_type: FlowType) -> Result<(), DraftStoreError> {
        self.drafts.write().await.remove(&(user_id.clone(), flow_type));
        Ok(())
    }
}
