//! Expense registration: draft handling, record API calls and field prompts.

use async_trait::async_trait;
use std::sync::Arc;

use super::DraftRepository;
use crate::application::engine::FlowDefinition;
use crate::domain::flows::{ExpenseDraft, ExpenseField};
use crate::domain::foundation::{RecordId, UserId};
use crate::domain::registration::{
    AccessGate, Choice, FieldUpdates, FlowMessages, FlowType, ServiceError,
};
use crate::ports::{
    DomainService, DraftStore, FieldPrompt, FieldPrompts, MessagingChannel, MissingFieldPrompt,
    RecordApi,
};

/// Categories offered in the category menu.
pub const EXPENSE_CATEGORIES: [(&str, &str); 6] = [
    ("feed", "Feed"),
    ("veterinary", "Veterinary"),
    ("labor", "Labor"),
    ("fuel", "Fuel"),
    ("maintenance", "Maintenance"),
    ("other", "Other"),
];

pub struct ExpenseService {
    drafts: DraftRepository<ExpenseDraft>,
    records: Arc<dyn RecordApi>,
}

impl ExpenseService {
    pub fn new(drafts: Arc<dyn DraftStore>, records: Arc<dyn RecordApi>) -> Self {
        Self {
            drafts: DraftRepository::new(drafts, FlowType::Expense),
            records,
        }
    }
}

#[async_trait]
impl DomainService for ExpenseService {
    type Field = ExpenseField;
    type Draft = ExpenseDraft;

    fn flow_type(&self) -> FlowType {
        FlowType::Expense
    }

    async fn load_draft(&self, user_id: &UserId) -> Result<ExpenseDraft, ServiceError> {
        self.drafts.load(user_id).await
    }

    async fn save_draft(&self, user_id: &UserId, draft: &ExpenseDraft) -> Result<(), ServiceError> {
        self.drafts.save(user_id, draft).await
    }

    async fn clear_draft(&self, user_id: &UserId) -> Result<(), ServiceError> {
        self.drafts.clear(user_id).await
    }

    /// Valid values are kept even when another value in the same call is rejected.
    async fn update_draft(
        &self,
        user_id: &UserId,
        updates: &FieldUpdates<ExpenseField>,
    ) -> Result<ExpenseDraft, ServiceError> {
        let mut draft = self.drafts.load(user_id).await?;
        let mut rejected = None;
        for update in updates.iter() {
            if let Err(e) = draft.apply(update.field, &update.value) {
                rejected.get_or_insert(e);
            }
        }
        self.drafts.save(user_id, &draft).await?;
        match rejected {
            Some(e) => Err(e),
            None => Ok(draft),
        }
    }

    fn has_missing_fields(&self, draft: &ExpenseDraft) -> Vec<ExpenseField> {
        draft.missing_fields()
    }

    fn build_draft_summary(&self, draft: &ExpenseDraft) -> String {
        draft.summary()
    }

    async fn create(
        &self,
        user_id: &UserId,
        draft: &ExpenseDraft,
    ) -> Result<RecordId, ServiceError> {
        Ok(self
            .records
            .create(FlowType::Expense, user_id, &draft.to_payload())
            .await?)
    }

    async fn update(
        &self,
        user_id: &UserId,
        record_id: &RecordId,
        draft: &ExpenseDraft,
        _updates: &FieldUpdates<ExpenseField>,
    ) -> Result<(), ServiceError> {
        Ok(self
            .records
            .update(FlowType::Expense, user_id, record_id, &draft.to_payload())
            .await?)
    }

    async fn delete(&self, user_id: &UserId, record_id: &RecordId) -> Result<(), ServiceError> {
        Ok(self
            .records
            .delete(FlowType::Expense, user_id, record_id)
            .await?)
    }

    fn handle_service_error(&self, err: &ServiceError) -> String {
        match err {
            ServiceError::RecordApi(_) | ServiceError::Unavailable(_) => {
                "I couldn't save the expense right now.".to_string()
            }
            other => other.user_message(),
        }
    }
}

pub struct ExpensePrompts {
    channel: Arc<dyn MessagingChannel>,
}

impl ExpensePrompts {
    pub fn new(channel: Arc<dyn MessagingChannel>) -> Self {
        Self { channel }
    }

    /// Sends the category menu; falls back to plain text when the channel fails.
    async fn category_menu(&self, user_id: &UserId, body: &str) -> FieldPrompt {
        let choices: Vec<Choice> = EXPENSE_CATEGORIES
            .iter()
            .map(|(id, title)| Choice::new(*id, *title))
            .collect();
        match self.channel.send_choices(user_id, body, &choices).await {
            Ok(()) => FieldPrompt::interactive(body),
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Category menu not sent");
                FieldPrompt::text(body)
            }
        }
    }
}

#[async_trait]
impl FieldPrompts<ExpenseService> for ExpensePrompts {
    async fn ask_missing(
        &self,
        user_id: &UserId,
        field: ExpenseField,
        _draft: &ExpenseDraft,
    ) -> Result<MissingFieldPrompt<ExpenseDraft>, ServiceError> {
        let prompt = match field {
            ExpenseField::Value => FieldPrompt::text("How much was the expense?"),
            ExpenseField::Category => {
                self.category_menu(user_id, "Which category is this expense?").await
            }
            ExpenseField::Description => {
                FieldPrompt::text("Give me a short description of the expense.")
            }
            ExpenseField::PaymentDate => {
                FieldPrompt::text("When was it paid? (for example 31/05/2024, or \"today\")")
            }
            ExpenseField::Supplier => FieldPrompt::text("Who was the supplier?"),
        };
        Ok(MissingFieldPrompt::new(prompt))
    }

    async fn ask_edit(
        &self,
        user_id: &UserId,
        field: ExpenseField,
    ) -> Result<FieldPrompt, ServiceError> {
        let prompt = match field {
            ExpenseField::Value => FieldPrompt::text("What is the correct amount?"),
            ExpenseField::Category => self.category_menu(user_id, "Pick the new category.").await,
            ExpenseField::Description => FieldPrompt::text("What should the description be?"),
            ExpenseField::PaymentDate => FieldPrompt::text("What is the correct payment date?"),
            ExpenseField::Supplier => FieldPrompt::text("Who is the correct supplier?"),
        };
        Ok(prompt)
    }
}

pub fn expense_messages() -> FlowMessages {
    FlowMessages {
        created: "Expense registered!\n\n{summary}".to_string(),
        updated: "Expense updated!\n\n{summary}".to_string(),
        deleted: "The expense was deleted.".to_string(),
        cancelled: "Expense registration cancelled.".to_string(),
        record_not_found: "I couldn't find an expense to change.".to_string(),
        edit_intro: "Sure, what should I change in this expense?".to_string(),
        edit_examples: vec![
            "The value was 150".to_string(),
            "Change the category to fuel".to_string(),
            "It was paid yesterday".to_string(),
        ],
        ..FlowMessages::default()
    }
}

/// Wires the expense flow.
pub fn expense_definition(
    drafts: Arc<dyn DraftStore>,
    records: Arc<dyn RecordApi>,
    channel: Arc<dyn MessagingChannel>,
    gate: AccessGate,
) -> FlowDefinition<ExpenseService> {
    FlowDefinition::new(
        Arc::new(ExpenseService::new(drafts, records)),
        Arc::new(ExpensePrompts::new(channel)),
    )
    .with_messages(expense_messages())
    .with_gate(gate)
}
