//! Draft contract and completed-draft snapshots.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RegistrationStatus;
use crate::domain::foundation::RecordId;

/// A partially filled record collected over several chat turns.
///
/// Drafts are owned values: `clone()` is a full structural copy, so a live
/// draft never shares state with a snapshot taken from it.
pub trait FlowDraft:
    Clone
    + Default
    + PartialEq
    + std::fmt::Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    fn status(&self) -> RegistrationStatus;

    fn set_status(&mut self, status: RegistrationStatus);

    fn record_id(&self) -> Option<&RecordId>;

    fn set_record_id(&mut self, record_id: Option<RecordId>);
}

/// Errors capturing or restoring a snapshot.
#[derive(Debug, thiserror::Error)]
#[error("Draft snapshot is unreadable: {0}")]
pub struct SnapshotError(#[from] serde_json::Error);

/// The persisted form of a draft at the moment it was completed.
///
/// Held inside the session document. Capturing and restoring both produce
/// values that own all their data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftSnapshot(Value);

impl DraftSnapshot {
    pub fn capture<D: FlowDraft>(draft: &D) -> Result<Self, SnapshotError> {
        Ok(Self(serde_json::to_value(draft)?))
    }

    /// Materializes a fresh draft from the snapshot.
    pub fn restore<D: FlowDraft>(&self) -> Result<D, SnapshotError> {
        Ok(D::deserialize(&self.0)?)
    }

    /// Record id embedded in the snapshot, if the draft had one.
    pub fn record_id<D: FlowDraft>(&self) -> Option<RecordId> {
        self.restore::<D>()
            .ok()
            .and_then(|draft| draft.record_id().cloned())
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}
