//! Session Store Port - per-user session documents.
//!
//! Implementations are expected to be atomic per call and to expire idle
//! sessions on their own TTL; an expired session reads back as `None`.

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::domain::registration::{SessionPatch, SessionState};

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    #[error("Stored session is corrupt: {0}")]
    Corrupt(String),

    #[error("Failed to serialize session: {0}")]
    SerializationFailed(String),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the user's session, `None` when absent or expired.
    async fn get(&self, user_id: &UserId) -> Result<Option<SessionState>, SessionStoreError>;

    /// Shallow-merges the patch into the stored session, creating it if absent.
    ///
    /// No lock is held between the read and the write of the merge.
    async fn set(&self, user_id: &UserId, patch: SessionPatch) -> Result<(), SessionStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_error_mentions_cause() {
        let err = SessionStoreError::Corrupt("expected object".into());
        assert!(err.to_string().contains("expected object"));
    }
}
