//! Engine requests and responses.

use serde::Serialize;

use super::PlanContext;
use crate::domain::foundation::{RecordId, UserId};

/// Who is talking to the engine, and on which plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowContext {
    pub user_id: UserId,
    pub plan: PlanContext,
}

impl FlowContext {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            plan: PlanContext::default(),
        }
    }

    pub fn with_plan(mut self, plan: PlanContext) -> Self {
        self.plan = plan;
        self
    }
}

/// What an engine call achieved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowOutcome {
    /// A single field is now awaited.
    Prompted { field: String },
    Created { record_id: RecordId },
    Updated { record_id: RecordId },
    EditModeEntered { record_id: RecordId },
    Deleted { record_id: RecordId },
    Cancelled,
    Denied,
    NotFound,
    InvalidField { field: String },
    NothingToConfirm,
    AlreadyCompleted,
    /// An external call failed; the user got an edit/cancel recovery prompt.
    Failed,
}

/// Response returned by every public engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowResponse {
    /// Text for this turn, for the caller's transcript or to relay.
    pub message: String,
    /// True when the user already received an interactive message this turn.
    pub interactive: bool,
    pub outcome: FlowOutcome,
}

impl FlowResponse {
    pub fn new(message: impl Into<String>, interactive: bool, outcome: FlowOutcome) -> Self {
        Self {
            message: message.into(),
            interactive,
            outcome,
        }
    }

    pub fn prompted(field: &str, message: impl Into<String>, interactive: bool) -> Self {
        Self::new(
            message,
            interactive,
            FlowOutcome::Prompted {
                field: field.to_string(),
            },
        )
    }

    pub fn text(message: impl Into<String>, outcome: FlowOutcome) -> Self {
        Self::new(message, false, outcome)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, FlowOutcome::Failed)
    }

    /// Record id the response refers to, if any.
    pub fn record_id(&self) -> Option<&RecordId> {
        match &self.outcome {
            FlowOutcome::Created { record_id }
            | FlowOutcome::Updated { record_id }
            | FlowOutcome::EditModeEntered { record_id }
            | FlowOutcome::Deleted { record_id } => Some(record_id),
            _ => None,
        }
    }
}
