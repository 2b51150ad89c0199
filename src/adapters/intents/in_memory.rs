//! In-memory intent history, capped per user.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::adapters::{evict_expired, Expiring};
use crate::domain::foundation::UserId;
use crate::ports::{IntentEntry, IntentHistory, IntentHistoryError};

#[derive(Debug, Clone)]
pub struct InMemoryIntentHistory {
    entries: Arc<RwLock<HashMap<UserId, Expiring<VecDeque<IntentEntry>>>>>,
    max_entries: usize,
    ttl: Duration,
}

impl InMemoryIntentHistory {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            max_entries: max_entries.max(1),
            ttl,
        }
    }
}

#[async_trait]
impl IntentHistory for InMemoryIntentHistory {
    async fn append(&self, user_id: &UserId, entry: IntentEntry) -> Result<(), IntentHistoryError> {
        let mut entries = self.entries.write().await;
        let mut history = entries
            .remove(user_id)
            .and_then(Expiring::into_live)
            .unwrap_or_default();
        evict_expired(&mut *entries);
        history.push_back(entry);
        while history.len() > self.max_entries {
            history.pop_front();
        }
        entries.insert(user_id.clone(), Expiring::new(history, self.ttl));
        Ok(())
    }

    async fn recent(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<IntentEntry>, IntentHistoryError> {
        let entries = self.entries.read().await;
        let Some(history) = entries.get(user_id).and_then(|entry| entry.live()) else {
            return Ok(Vec::new());
        };
        let skip = history.len().saturating_sub(limit);
        Ok(history.iter().skip(skip).cloned().collect())
    }

    async fn clear(&self, user_id: &UserId) -> Result<(), IntentHistoryError> {
        self.entries.write().await.remove(user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("5511999990000").unwrap()
    }

    #[tokio::test]
    async fn recent_returns_newest_entries_oldest_first() {
        let history = InMemoryIntentHistory::new(10, Duration::from_secs(60));
        for intent in ["greet", "register_death", "answer"] {
            history.append(&user(), IntentEntry::new(intent)).await.unwrap();
        }

        let recent: Vec<String> = history
            .recent(&user(), 2)
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.intent)
            .collect();

        assert_eq!(recent, vec!["register_death", "answer"]);
    }

    #[tokio::test]
    async fn history_is_capped() {
        let history = InMemoryIntentHistory::new(2, Duration::from_secs(60));
        for intent in ["a", "b", "c"] {
            history.append(&user(), IntentEntry::new(intent)).await.unwrap();
        }
        assert_eq!(history.recent(&user(), 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn clear_empties_history() {
        let history = InMemoryIntentHistory::new(10, Duration::from_secs(60));
        history.append(&user(), IntentEntry::new("a")).await.unwrap();
        history.clear(&user()).await.unwrap();
        assert!(history.recent(&user(), 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_evicts_expired_histories() {
        let history = InMemoryIntentHistory::new(10, Duration::ZERO);
        let other = UserId::new("5511888880000").unwrap();
        history.append(&other, IntentEntry::new("a")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        history.append(&user(), IntentEntry::new("b")).await.unwrap();

        let entries = history.entries.read().await;
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key(&user()));
    }
}
