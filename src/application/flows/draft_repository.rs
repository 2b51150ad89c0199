//! Typed access to one flow's drafts in a [`DraftStore`].

use std::marker::PhantomData;
use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::registration::{FlowDraft, FlowType, ServiceError};
use crate::ports::DraftStore;

pub struct DraftRepository<T> {
    store: Arc<dyn DraftStore>,
    flow_type: FlowType,
    _draft: PhantomData<fn() -> T>,
}

impl<T: FlowDraft> DraftRepository<T> {
    pub fn new(store: Arc<dyn DraftStore>, flow_type: FlowType) -> Self {
        Self {
            store,
            flow_type,
            _draft: PhantomData,
        }
    }

    /// Loads the draft; an absent draft is an empty one.
    pub async fn load(&self, user_id: &UserId) -> Result<T, ServiceError> {
        match self.store.load(user_id, self.flow_type).await? {
            Some(value) => serde_json::from_value(value).map_err(|e| {
                let flow_type = self.flow_type;
                ServiceError::Storage(format!("Stored {} draft is unreadable: {}", flow_type, e))
            }),
            None => Ok(T::default()),
        }
    }

    pub async fn save(&self, user_id: &UserId, draft: &T) -> Result<(), ServiceError> {
        let value = serde_json::to_value(draft).map_err(|e| ServiceError::Storage(e.to_string()))?;
        self.store.save(user_id, self.flow_type, &value).await?;
        Ok(())
    }

    pub async fn clear(&self, user_id: &UserId) -> Result<(), ServiceError> {
        self.store.clear(user_id, self.flow_type).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryDraftStore;
    use crate::domain::flows::DeathDraft;
    use serde_json::json;
    use std::time::Duration;

    fn user() -> UserId {
        UserId::new("5511999990000").unwrap()
    }

    #[tokio::test]
    async fn absent_draft_loads_empty() {
        let repo = DraftRepository::<DeathDraft>::new(
            Arc::new(InMemoryDraftStore::new(Duration::from_secs(60))),
            FlowType::Death,
        );
        assert_eq!(repo.load(&user()).await.unwrap(), DeathDraft::default());
    }

    #[tokio::test]
    async fn saved_draft_loads_back() {
        let repo = DraftRepository::<DeathDraft>::new(
            Arc::new(InMemoryDraftStore::new(Duration::from_secs(60))),
            FlowType::Death,
        );
        let draft = DeathDraft {
            quantity: Some(3),
            ..Default::default()
        };
        repo.save(&user(), &draft).await.unwrap();
        assert_eq!(repo.load(&user()).await.unwrap(), draft);
    }

    #[tokio::test]
    async fn unreadable_draft_is_a_storage_error() {
        let store = Arc::new(InMemoryDraftStore::new(Duration::from_secs(60)));
        store
            .save(&user(), FlowType::Death, &json!({"quantity": "many"}))
            .await
            .unwrap();
        let repo = DraftRepository::<DeathDraft>::new(store, FlowType::Death);

        assert!(matches!(repo.load(&user()).await, Err(ServiceError::Storage(_))));
    }
}
