//! Registration phase state machine.
//!
//! The phase is never stored; it is derived from the stored
//! [`ActiveRegistration`](super::ActiveRegistration) fields. One inbound event
//! may move the registration across several phases (a start that fills every
//! required field goes straight to `Completed`), so the transition table lists
//! what is reachable within a single engine call.

use serde::Serialize;
use std::fmt;

use crate::domain::foundation::StateMachine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPhase {
    /// No flow is active for the user.
    Inactive,
    /// Merging values, no single field awaited.
    Collecting,
    /// Waiting for the value of one field of a new record.
    FieldWait,
    /// A record exists and its snapshot is stored.
    Completed,
    /// Completed record reopened for editing.
    EditingDraft,
    /// Waiting for a new value of one field of an existing record.
    FieldEditWait,
}

impl RegistrationPhase {
    /// Phases during which a backing record exists.
    pub fn has_record(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::EditingDraft | Self::FieldEditWait
        )
    }
}

impl fmt::Display for RegistrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Inactive => "inactive",
            Self::Collecting => "collecting",
            Self::FieldWait => "field_wait",
            Self::Completed => "completed",
            Self::EditingDraft => "editing_draft",
            Self::FieldEditWait => "field_edit_wait",
        };
        write!(f, "{}", name)
    }
}

impl StateMachine for RegistrationPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use RegistrationPhase::*;
        match self {
            // Start; or edit entry recovering the record from the persisted draft.
            Inactive => vec![Collecting, FieldWait, Completed, EditingDraft],
            Collecting => vec![FieldWait, Completed, Inactive],
            FieldWait => vec![Collecting, FieldWait, Completed, Inactive],
            // A change outside edit mode starts a new registration.
            Completed => vec![Collecting, FieldWait, EditingDraft, FieldEditWait, Inactive],
            EditingDraft => vec![Completed, FieldEditWait, Collecting, FieldWait, Inactive],
            FieldEditWait => vec![Completed, EditingDraft, Collecting, FieldWait, Inactive],
        }
    }
}
