//! Plan-based access gate guarding flow entry points.
//!
//! The gate is fail-closed on the allow-list: once a flow lists allowed
//! plans, a caller without a plan id is denied.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The caller's current plan identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanContext {
    pub plan_id: Option<String>,
    pub sub_plan_id: Option<String>,
}

impl PlanContext {
    pub fn new(plan_id: Option<String>, sub_plan_id: Option<String>) -> Self {
        Self { plan_id, sub_plan_id }
    }
}

/// Access rules for one flow type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlConfig {
    /// Plans allowed to use the flow. Empty means every plan.
    #[serde(default)]
    pub allowed_plan_ids: Vec<String>,

    /// Sub-plans that may never use the flow.
    #[serde(default)]
    pub not_allowed_sub_plan_ids: Vec<String>,

    /// Sent to the user on denial.
    #[serde(default = "default_denied_message")]
    pub denied_message: String,

    /// Whether a denial also resets the active registration.
    #[serde(default = "default_reset_on_deny")]
    pub reset_registration_on_deny: bool,
}

fn default_denied_message() -> String {
    "This feature is not available on your current plan.".to_string()
}

fn default_reset_on_deny() -> bool {
    true
}

impl Default for AccessControlConfig {
    fn default() -> Self {
        Self {
            allowed_plan_ids: Vec::new(),
            not_allowed_sub_plan_ids: Vec::new(),
            denied_message: default_denied_message(),
            reset_registration_on_deny: default_reset_on_deny(),
        }
    }
}

/// Why the gate refused entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDeniedReason {
    PlanNotAllowed { plan_id: Option<String> },
    SubPlanNotAllowed { sub_plan_id: String },
}

impl fmt::Display for AccessDeniedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessDeniedReason::PlanNotAllowed { plan_id: Some(plan) } => {
                write!(f, "plan '{}' is not allowed", plan)
            }
            AccessDeniedReason::PlanNotAllowed { plan_id: None } => write!(f, "no plan on record"),
            AccessDeniedReason::SubPlanNotAllowed { sub_plan_id } => {
                write!(f, "sub-plan '{}' is not allowed", sub_plan_id)
            }
        }
    }
}

/// Result of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessResult {
    Allowed,
    Denied(AccessDeniedReason),
}

impl AccessResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessResult::Allowed)
    }
}

/// Evaluates an [`AccessControlConfig`] against callers' plans.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    config: AccessControlConfig,
}

impl AccessGate {
    pub fn new(config: AccessControlConfig) -> Self {
        Self { config }
    }

    /// A gate that lets every caller through.
    pub fn open() -> Self {
        Self::default()
    }

    pub fn check(&self, plan: &PlanContext) -> AccessResult {
        if let Some(sub_plan) = &plan.sub_plan_id {
            if self.config.not_allowed_sub_plan_ids.iter().any(|id| id == sub_plan) {
                return AccessResult::Denied(AccessDeniedReason::SubPlanNotAllowed {
                    sub_plan_id: sub_plan.clone(),
                });
            }
        }

        if self.config.allowed_plan_ids.is_empty() {
            return AccessResult::Allowed;
        }

        match &plan.plan_id {
            Some(id) if self.config.allowed_plan_ids.iter().any(|allowed| allowed == id) => {
                AccessResult::Allowed
            }
            other => AccessResult::Denied(AccessDeniedReason::PlanNotAllowed {
                plan_id: other.clone(),
            }),
        }
    }

    pub fn denied_message(&self) -> &str {
        &self.config.denied_message
    }

    pub fn resets_on_deny(&self) -> bool {
        self.config.reset_registration_on_deny
    }
}
