//! Per-user session state.
//!
//! The session is a loose key/value document shared with other modules of
//! the assistant. The registration engine owns exactly one key,
//! `activeRegistration`, and never touches the others.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{DraftSnapshot, FlowType, RegistrationPhase};
use crate::domain::foundation::{CorrelationId, RecordId};

/// Session key holding the [`ActiveRegistration`].
pub const ACTIVE_REGISTRATION_KEY: &str = "activeRegistration";

/// Whether the registration is producing a new record or editing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RegistrationStep {
    #[default]
    Creating,
    Editing,
}

/// Progress of the registration's draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    #[default]
    Collecting,
    /// Accepted when read back from the store; no engine path writes it.
    AwaitingConfirmation,
    Completed,
}

/// The registration sub-state of a user's session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActiveRegistration {
    #[serde(rename = "type")]
    pub flow_type: Option<FlowType>,
    pub step: RegistrationStep,
    pub status: RegistrationStatus,
    pub awaiting_input_for_field: Option<String>,
    pub edit_mode: bool,
    pub last_created_record_id: Option<RecordId>,
    pub completed_draft_snapshot: Option<DraftSnapshot>,
    pub snapshot_session_id: Option<CorrelationId>,
    pub session_id: Option<CorrelationId>,
}

impl ActiveRegistration {
    /// A brand new collecting registration with a freshly minted correlation id.
    pub fn fresh(flow_type: FlowType) -> Self {
        Self {
            flow_type: Some(flow_type),
            session_id: Some(CorrelationId::new()),
            ..Self::default()
        }
    }

    pub fn phase(&self) -> RegistrationPhase {
        if self.flow_type.is_none() {
            return RegistrationPhase::Inactive;
        }
        let awaiting = self.awaiting_input_for_field.is_some();
        match self.status {
            RegistrationStatus::Completed => match (self.edit_mode, awaiting) {
                (_, true) => RegistrationPhase::FieldEditWait,
                (true, false) => RegistrationPhase::EditingDraft,
                (false, false) => RegistrationPhase::Completed,
            },
            RegistrationStatus::Collecting | RegistrationStatus::AwaitingConfirmation => {
                if awaiting {
                    RegistrationPhase::FieldWait
                } else {
                    RegistrationPhase::Collecting
                }
            }
        }
    }

    /// True when this registration belongs to `flow_type`.
    pub fn is_for(&self, flow_type: FlowType) -> bool {
        self.flow_type == Some(flow_type)
    }

    pub fn is_completed(&self) -> bool {
        self.status == RegistrationStatus::Completed
    }

    /// Records the single field now awaited, superseding any previous one.
    pub fn await_field(&mut self, field: &str) {
        self.awaiting_input_for_field = Some(field.to_string());
    }

    /// Clears and returns the awaited field.
    pub fn take_awaiting(&mut self) -> Option<String> {
        self.awaiting_input_for_field.take()
    }

    /// Moves the registration to `completed` for the given record.
    pub fn mark_completed(&mut self, record_id: RecordId, snapshot: DraftSnapshot) {
        self.status = RegistrationStatus::Completed;
        self.last_created_record_id = Some(record_id);
        self.completed_draft_snapshot = Some(snapshot);
        self.snapshot_session_id = self.session_id;
        self.awaiting_input_for_field = None;
    }

    pub fn enter_edit_mode(&mut self, record_id: RecordId) {
        self.edit_mode = true;
        self.step = RegistrationStep::Editing;
        self.awaiting_input_for_field = None;
        self.last_created_record_id = Some(record_id);
    }

    /// Leaves edit mode; `step` stays `Editing` to record that the record was edited.
    pub fn leave_edit_mode(&mut self) {
        self.edit_mode = false;
    }

    /// True when the stored snapshot was taken under the current correlation id.
    pub fn snapshot_is_current(&self) -> bool {
        self.completed_draft_snapshot.is_some()
            && self.snapshot_session_id.is_some()
            && self.snapshot_session_id == self.session_id
    }

    /// Checks the structural invariants of the registration.
    pub fn is_consistent(&self) -> bool {
        let edit_implies_editing = !self.edit_mode || self.step == RegistrationStep::Editing;
        let completed_has_record = !self.is_completed() || self.last_created_record_id.is_some();
        edit_implies_editing && completed_has_record
    }
}

/// The whole session document of one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionState(Map<String, Value>);

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Reads the registration sub-state; absent or `null` reads as `None`.
    pub fn active_registration(&self) -> Result<Option<ActiveRegistration>, serde_json::Error> {
        match self.0.get(ACTIVE_REGISTRATION_KEY) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some),
        }
    }

    /// Shallow merge: every top-level key of the patch replaces the stored one.
    pub fn merge(&mut self, patch: SessionPatch) {
        for (key, value) in patch.0 {
            self.0.insert(key, value);
        }
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// Top-level keys to shallow-merge into a [`SessionState`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionPatch(Map<String, Value>);

impl SessionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn active_registration(
        registration: &ActiveRegistration,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new().set(ACTIVE_REGISTRATION_KEY, serde_json::to_value(registration)?))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str) -> RecordId {
        RecordId::new(id).unwrap()
    }

    mod active_registration {
        use super::*;

        #[test]
        fn default_is_inactive() {
            assert_eq!(ActiveRegistration::default().phase(), RegistrationPhase::Inactive);
        }

        #[test]
        fn fresh_registration_collects_with_correlation_id() {
            let reg = ActiveRegistration::fresh(FlowType::Death);
            assert_eq!(reg.phase(), RegistrationPhase::Collecting);
            assert!(reg.session_id.is_some());
            assert_eq!(reg.step, RegistrationStep::Creating);
        }

        #[test]
        fn awaiting_field_supersedes_previous() {
            let mut reg = ActiveRegistration::fresh(FlowType::Death);
            reg.await_field("quantity");
            reg.await_field("cause");
            assert_eq!(reg.awaiting_input_for_field.as_deref(), Some("cause"));
            assert_eq!(reg.phase(), RegistrationPhase::FieldWait);
        }

        #[test]
        fn mark_completed_links_record_and_snapshot() {
            let mut reg = ActiveRegistration::fresh(FlowType::Expense);
            reg.await_field("value");
            reg.mark_completed(record("rec-1"), DraftSnapshot::from_value(json!({})));

            assert_eq!(reg.phase(), RegistrationPhase::Completed);
            assert_eq!(reg.last_created_record_id, Some(record("rec-1")));
            assert!(reg.awaiting_input_for_field.is_none());
            assert!(reg.snapshot_is_current());
            assert!(reg.is_consistent());
        }

        #[test]
        fn edit_mode_sets_editing_step() {
            let mut reg = ActiveRegistration::fresh(FlowType::Expense);
            reg.mark_completed(record("rec-1"), DraftSnapshot::from_value(json!({})));
            reg.enter_edit_mode(record("rec-1"));

            assert_eq!(reg.step, RegistrationStep::Editing);
            assert_eq!(reg.phase(), RegistrationPhase::EditingDraft);
            reg.await_field("value");
            assert_eq!(reg.phase(), RegistrationPhase::FieldEditWait);
            assert!(reg.is_consistent());
        }

        #[test]
        fn leaving_edit_mode_keeps_editing_step() {
            let mut reg = ActiveRegistration::fresh(FlowType::Expense);
            reg.mark_completed(record("rec-1"), DraftSnapshot::from_value(json!({})));
            reg.enter_edit_mode(record("rec-1"));
            reg.leave_edit_mode();

            assert_eq!(reg.step, RegistrationStep::Editing);
            assert_eq!(reg.phase(), RegistrationPhase::Completed);
            assert!(reg.is_consistent());
        }

        #[test]
        fn inconsistent_when_edit_mode_without_editing_step() {
            let reg = ActiveRegistration {
                flow_type: Some(FlowType::Sale),
                edit_mode: true,
                ..Default::default()
            };
            assert!(!reg.is_consistent());
        }

        #[test]
        fn snapshot_is_stale_after_new_correlation_id() {
            let mut reg = ActiveRegistration::fresh(FlowType::Expense);
            reg.mark_completed(record("rec-1"), DraftSnapshot::from_value(json!({})));
            reg.session_id = Some(CorrelationId::new());
            assert!(!reg.snapshot_is_current());
        }

        #[test]
        fn serializes_with_camel_case_keys() {
            let mut reg = ActiveRegistration::fresh(FlowType::Birth);
            reg.await_field("quantity");
            let value = serde_json::to_value(&reg).unwrap();

            assert_eq!(value["type"], json!("birth"));
            assert_eq!(value["step"], json!("Creating"));
            assert_eq!(value["status"], json!("collecting"));
            assert_eq!(value["awaitingInputForField"], json!("quantity"));
            assert_eq!(value["editMode"], json!(false));
        }

        #[test]
        fn deserializes_partial_documents_with_defaults() {
            let raw = json!({"type": "sale", "status": "awaiting_confirmation"});
            let reg: ActiveRegistration = serde_json::from_value(raw).unwrap();
            assert_eq!(reg.flow_type, Some(FlowType::Sale));
            assert_eq!(reg.status, RegistrationStatus::AwaitingConfirmation);
            assert_eq!(reg.phase(), RegistrationPhase::Collecting);
        }
    }

    mod session_state {
        use super::*;

        #[test]
        fn merge_replaces_only_patched_keys() {
            let mut state = SessionState::from_map(
                json!({"language": "pt", "activeRegistration": null})
                    .as_object()
                    .cloned()
                    .unwrap(),
            );
            let reg = ActiveRegistration::fresh(FlowType::Expense);
            state.merge(SessionPatch::active_registration(&reg).unwrap());

            assert_eq!(state.get("language"), Some(&json!("pt")));
            assert_eq!(state.active_registration().unwrap(), Some(reg));
        }

        #[test]
        fn null_registration_reads_as_none() {
            let state = SessionState::from_map(
                json!({"activeRegistration": null}).as_object().cloned().unwrap(),
            );
            assert_eq!(state.active_registration().unwrap(), None);
        }

        #[test]
        fn corrupt_registration_is_an_error() {
            let state = SessionState::from_map(
                json!({"activeRegistration": {"type": 12}}).as_object().cloned().unwrap(),
            );
            assert!(state.active_registration().is_err());
        }
    }
}
