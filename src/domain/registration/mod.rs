//! Registration domain module.
//!
//! The vocabulary of the generic multi-turn registration flow: flow types,
//! field values, session sub-state, drafts and their snapshots, the phase
//! state machine, the access gate and the engine's responses.

mod access;
mod draft;
mod errors;
mod field;
mod flow_type;
mod messages;
mod phase;
mod response;
mod session;

pub use access::{AccessControlConfig, AccessDeniedReason, AccessGate, AccessResult, PlanContext};
pub use draft::{DraftSnapshot, FlowDraft, SnapshotError};
pub use errors::ServiceError;
pub use field::{EntityRef, FieldName, FieldUpdate, FieldUpdates, FieldValue, RawFieldUpdates};
pub use flow_type::FlowType;
pub use messages::{Choice, FlowMessages, CHOICE_CANCEL, CHOICE_DELETE, CHOICE_EDIT};
pub use phase::RegistrationPhase;
pub use response::{FlowContext, FlowOutcome, FlowResponse};
pub use session::{
    ActiveRegistration, RegistrationStatus, RegistrationStep, SessionPatch, SessionState,
    ACTIVE_REGISTRATION_KEY,
};
