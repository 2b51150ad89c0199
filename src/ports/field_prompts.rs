//! Field Prompts Port - per-field questions.
//!
//! Implementations map every field of their domain to a prompt with an
//! exhaustive `match`, so a field without a prompt fails to compile. A
//! prompt may deliver an interactive menu itself and report it through
//! `interactive`.

use async_trait::async_trait;

use super::DomainService;
use crate::domain::foundation::UserId;
use crate::domain::registration::ServiceError;

/// The question asked for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPrompt {
    pub message: String,
    /// True when the prompt already sent an interactive message.
    pub interactive: bool,
}

impl FieldPrompt {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            interactive: false,
        }
    }

    pub fn interactive(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            interactive: true,
        }
    }
}

/// The question asked for a missing required field, optionally with a draft
/// the handler adjusted (for instance by filling a default).
#[derive(Debug, Clone, PartialEq)]
pub struct MissingFieldPrompt<T> {
    pub prompt: FieldPrompt,
    pub draft: Option<T>,
}

impl<T> MissingFieldPrompt<T> {
    pub fn new(prompt: FieldPrompt) -> Self {
        Self { prompt, draft: None }
    }

    pub fn with_draft(mut self, draft: T) -> Self {
        self.draft = Some(draft);
        self
    }
}

#[async_trait]
pub trait FieldPrompts<D: DomainService>: Send + Sync {
    /// Missing-field handler: asks for a value not known yet.
    async fn ask_missing(
        &self,
        user_id: &UserId,
        field: D::Field,
        draft: &D::Draft,
    ) -> Result<MissingFieldPrompt<D::Draft>, ServiceError>;

    /// Field editor: asks for a new value of an already known field.
    async fn ask_edit(
        &self,
        user_id: &UserId,
        field: D::Field,
    ) -> Result<FieldPrompt, ServiceError>;
}
