//! Animal death registration.

use async_trait::async_trait;
use std::sync::Arc;

use super::DraftRepository;
use crate::application::engine::FlowDefinition;
use crate::domain::flows::{DeathCause, DeathDraft, DeathField};
use crate::domain::foundation::{RecordId, UserId};
use crate::domain::registration::{
    AccessGate, Choice, FieldUpdates, FlowMessages, FlowType, ServiceError,
};
use crate::ports::{
    DomainService, DraftStore, FieldPrompt, FieldPrompts, MessagingChannel, MissingFieldPrompt,
    RecordApi,
};

pub struct DeathService {
    drafts: DraftRepository<DeathDraft>,
    records: Arc<dyn RecordApi>,
}

impl DeathService {
    pub fn new(drafts: Arc<dyn DraftStore>, records: Arc<dyn RecordApi>) -> Self {
        Self {
            drafts: DraftRepository::new(drafts, FlowType::Death),
            records,
        }
    }
}

#[async_trait]
impl DomainService for DeathService {
    type Field = DeathField;
    type Draft = DeathDraft;

    fn flow_type(&self) -> FlowType {
        FlowType::Death
    }

    async fn load_draft(&self, user_id: &UserId) -> Result<DeathDraft, ServiceError> {
        self.drafts.load(user_id).await
    }

    async fn save_draft(&self, user_id: &UserId, draft: &DeathDraft) -> Result<(), ServiceError> {
        self.drafts.save(user_id, draft).await
    }

    async fn clear_draft(&self, user_id: &UserId) -> Result<(), ServiceError> {
        self.drafts.clear(user_id).await
    }

    async fn update_draft(
        &self,
        user_id: &UserId,
        updates: &FieldUpdates<DeathField>,
    ) -> Result<DeathDraft, ServiceError> {
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

    fn has_missing_fields(&self, draft: &DeathDraft) -> Vec<DeathField> {
        draft.missing_fields()
    }

    fn build_draft_summary(&self, draft: &DeathDraft) -> String {
        draft.summary()
    }

    /// One sentence when the core facts are known.
    async fn build_natural_summary(&self, draft: &DeathDraft) -> Option<String> {
        let quantity = draft.quantity?;
        let category = draft.animal_category.as_ref()?;
        let cause = draft.cause.as_ref()?;
        let date = draft.death_date?;
        let noun = if quantity == 1 { "animal" } else { "animals" };
        Some(format!(
            "{} {} ({}) died on {}. Cause: {}.",
            quantity,
            noun,
            category.name,
            date.format("%d/%m/%Y"),
            cause.name
        ))
    }

    async fn create(&self, user_id: &UserId, draft: &DeathDraft) -> Result<RecordId, ServiceError> {
        Ok(self
            .records
            .create(FlowType::Death, user_id, &draft.to_payload())
            .await?)
    }

    async fn update(
        &self,
        user_id: &UserId,
        record_id: &RecordId,
        draft: &DeathDraft,
        _updates: &FieldUpdates<DeathField>,
    ) -> Result<(), ServiceError> {
        Ok(self
            .records
            .update(FlowType::Death, user_id, record_id, &draft.to_payload())
            .await?)
    }

    async fn delete(&self, user_id: &UserId, record_id: &RecordId) -> Result<(), ServiceError> {
        Ok(self.records.delete(FlowType::Death, user_id, record_id).await?)
    }
}

pub struct DeathPrompts {
    channel: Arc<dyn MessagingChannel>,
}

impl DeathPrompts {
    pub fn new(channel: Arc<dyn MessagingChannel>) -> Self {
        Self { channel }
    }

    async fn cause_menu(&self, user_id: &UserId, body: &str) -> FieldPrompt {
        let choices: Vec<Choice> = DeathCause::ALL
            .iter()
            .map(|cause| Choice::new(cause.id(), cause.name()))
            .collect();
        match self.channel.send_choices(user_id, body, &choices).await {
            Ok(()) => FieldPrompt::interactive(body),
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Cause menu not sent");
                FieldPrompt::text(body)
            }
        }
    }
}

#[async_trait]
impl FieldPrompts<DeathService> for DeathPrompts {
    async fn ask_missing(
        &self,
        user_id: &UserId,
        field: DeathField,
        _draft: &DeathDraft,
    ) -> Result<MissingFieldPrompt<DeathDraft>, ServiceError> {
        let prompt = match field {
            DeathField::Quantity => FieldPrompt::text("How many animals died?"),
            DeathField::AnimalCategory => {
                FieldPrompt::text("Which category were they? (for example calves, heifers, cows)")
            }
            DeathField::Cause => self.cause_menu(user_id, "What was the cause of death?").await,
            DeathField::DeathDate => {
                FieldPrompt::text("When did it happen? (for example 31/05/2024, or \"today\")")
            }
            DeathField::Location => FieldPrompt::text("Where did it happen?"),
        };
        Ok(MissingFieldPrompt::new(prompt))
    }

    async fn ask_edit(
        &self,
        user_id: &UserId,
        field: DeathField,
    ) -> Result<FieldPrompt, ServiceError> {
        let prompt = match field {
            DeathField::Quantity => FieldPrompt::text("What is the correct number of animals?"),
            DeathField::AnimalCategory => FieldPrompt::text("What is the correct animal category?"),
            DeathField::Cause => self.cause_menu(user_id, "Pick the correct cause.").await,
            DeathField::DeathDate => FieldPrompt::text("What is the correct date?"),
            DeathField::Location => FieldPrompt::text("Where did it actually happen?"),
        };
        Ok(prompt)
    }
}

pub fn death_messages() -> FlowMessages {
    FlowMessages {
        created: "Death registered.\n\n{summary}".to_string(),
        updated: "Death record updated.\n\n{summary}".to_string(),
        deleted: "The death record was deleted.".to_string(),
        cancelled: "Death registration cancelled.".to_string(),
        record_not_found: "I couldn't find a death record to change.".to_string(),
        edit_intro: "Sure, what should I change in this record?".to_string(),
        edit_examples: vec![
            "It was 2 animals".to_string(),
            "The cause was an accident".to_string(),
        ],
        ..FlowMessages::default()
    }
}

pub fn death_definition(
    drafts: Arc<dyn DraftStore>,
    records: Arc<dyn RecordApi>,
    channel: Arc<dyn MessagingChannel>,
    gate: AccessGate,
) -> FlowDefinition<DeathService> {
    FlowDefinition::new(
        Arc::new(DeathService::new(drafts, records)),
        Arc::new(DeathPrompts::new(channel)),
    )
    .with_messages(death_messages())
    .with_gate(gate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryChannel, InMemoryDraftStore, InMemoryRecordApi};
    use crate::domain::registration::FieldValue;
    use std::time::Duration;

    fn user() -> UserId {
        UserId::new("5511999990000").unwrap()
    }

    fn service() -> DeathService {
        DeathService::new(
            Arc::new(InMemoryDraftStore::new(Duration::from_secs(60))),
            Arc::new(InMemoryRecordApi::new()),
        )
    }

    #[tokio::test]
    async fn natural_summary_needs_core_facts() {
        let service = service();
        let mut draft = DeathDraft::default();
        draft.apply(DeathField::Quantity, &FieldValue::Number(1.0)).unwrap();
        assert_eq!(service.build_natural_summary(&draft).await, None);

        draft.apply(DeathField::AnimalCategory, &FieldValue::text("Calves")).unwrap();
        draft.apply(DeathField::Cause, &FieldValue::text("predator")).unwrap();
        draft.apply(DeathField::DeathDate, &FieldValue::text("2024-03-01")).unwrap();

        assert_eq!(
            service.build_natural_summary(&draft).await.as_deref(),
            Some("1 animal (Calves) died on 01/03/2024. Cause: Predator.")
        );
    }

    #[tokio::test]
    async fn create_sends_payload_to_record_api() {
        let records = Arc::new(InMemoryRecordApi::new());
        let service = DeathService::new(
            Arc::new(InMemoryDraftStore::new(Duration::from_secs(60))),
            records.clone(),
        );
        let mut draft = DeathDraft::default();
        draft.apply(DeathField::Quantity, &FieldValue::Number(2.0)).unwrap();

        let id = service.create(&user(), &draft).await.unwrap();

        let stored = records.get(&id).await.unwrap();
        assert_eq!(stored.flow_type, FlowType::Death);
        assert_eq!(stored.payload["quantity"], 2);
    }

    #[tokio::test]
    async fn cause_prompt_lists_every_cause() {
        let channel = Arc::new(InMemoryChannel::new());
        let prompts = DeathPrompts::new(channel.clone());

        let asked = prompts
            .ask_missing(&user(), DeathField::Cause, &DeathDraft::default())
            .await
            .unwrap();

        assert!(asked.prompt.interactive);
        assert_eq!(
            channel.last().await.unwrap().choice_ids(),
            vec!["disease", "accident", "predator", "birth_complications", "unknown"]
        );
    }

    #[tokio::test]
    async fn quantity_prompt_is_plain_text() {
        let prompts = DeathPrompts::new(Arc::new(InMemoryChannel::new()));
        let asked = prompts
            .ask_missing(&user(), DeathField::Quantity, &DeathDraft::default())
            .await
            .unwrap();
        assert!(!asked.prompt.interactive);
        assert!(asked.draft.is_none());
    }
}
