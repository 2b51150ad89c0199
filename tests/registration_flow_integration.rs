//! End-to-end registration scenarios through the router with the expense and
//! death flows on in-memory adapters.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use registration_flows::adapters::{
    InMemoryChannel, InMemoryDraftStore, InMemoryIntentHistory, InMemoryRecordApi,
    InMemorySessionStore,
};
use registration_flows::application::flows::{death_definition, expense_definition};
use registration_flows::application::{FlowCommand, FlowEngine, FlowPorts, FlowRouter, RouterError};
use registration_flows::domain::foundation::{RecordId, UserId};
use registration_flows::domain::registration::{
    AccessControlConfig, AccessGate, ActiveRegistration, FieldValue, FlowContext, FlowOutcome,
    FlowResponse, FlowType, PlanContext, RawFieldUpdates, RegistrationPhase, CHOICE_CANCEL,
    CHOICE_DELETE, CHOICE_EDIT,
};
use registration_flows::ports::{DraftStore, IntentEntry, IntentHistory, SessionStore};

struct App {
    router: FlowRouter,
    sessions: Arc<InMemorySessionStore>,
    drafts: Arc<InMemoryDraftStore>,
    records: Arc<InMemoryRecordApi>,
    channel: Arc<InMemoryChannel>,
    intents: Arc<InMemoryIntentHistory>,
}

impl App {
    fn new() -> Self {
        Self::with_expense_gate(AccessGate::open())
    }

    fn with_expense_gate(expense_gate: AccessGate) -> Self {
        let ttl = Duration::from_secs(3600);
        let sessions = Arc::new(InMemorySessionStore::new(ttl));
        let drafts = Arc::new(InMemoryDraftStore::new(ttl));
        let records = Arc::new(InMemoryRecordApi::new());
        let channel = Arc::new(InMemoryChannel::new());
        let intents = Arc::new(InMemoryIntentHistory::new(10, ttl));

        let ports = FlowPorts {
            sessions: sessions.clone(),
            channel: channel.clone(),
            intents: intents.clone(),
        };
        let expense =
            expense_definition(drafts.clone(), records.clone(), channel.clone(), expense_gate);
        let death = death_definition(
            drafts.clone(),
            records.clone(),
            channel.clone(),
            AccessGate::open(),
        );

        let router = FlowRouter::builder(sessions.clone())
            .register(Arc::new(FlowEngine::new(expense, ports.clone())))
            .register(Arc::new(FlowEngine::new(death, ports)))
            .build();

        Self {
            router,
            sessions,
            drafts,
            records,
            channel,
            intents,
        }
    }

    async fn send(&self, command: FlowCommand) -> FlowResponse {
        self.send_as(&ctx(), command).await
    }

    async fn send_as(&self, ctx: &FlowContext, command: FlowCommand) -> FlowResponse {
        self.router.handle(ctx, command).await.unwrap()
    }

    async fn registration(&self) -> ActiveRegistration {
        self.sessions
            .get(&user())
            .await
            .unwrap()
            .and_then(|state| state.active_registration().unwrap())
            .unwrap_or_default()
    }

    async fn draft(&self, flow_type: FlowType) -> Option<serde_json::Value> {
        self.drafts.load(&user(), flow_type).await.unwrap()
    }

    /// Registers a complete expense in one turn.
    async fn registered_expense(&self) -> RecordId {
        let response = self
            .send(start(
                FlowType::Expense,
                &[
                    ("value", "150"),
                    ("category", "Fuel"),
                    ("description", "Diesel"),
                    ("payment_date", "2024-05-31"),
                ],
            ))
            .await;
        response.record_id().cloned().expect("expense created")
    }
}

fn user() -> UserId {
    UserId::new("5511988887777").unwrap()
}

fn ctx() -> FlowContext {
    FlowContext::new(user())
}

fn raw(pairs: &[(&str, &str)]) -> RawFieldUpdates {
    let mut updates = RawFieldUpdates::new();
    for (name, value) in pairs {
        updates.push(*name, FieldValue::from_input(value));
    }
    updates
}

fn start(flow_type: FlowType, pairs: &[(&str, &str)]) -> FlowCommand {
    FlowCommand::Start {
        flow_type,
        updates: raw(pairs),
    }
}

fn answer(value: &str) -> FlowCommand {
    FlowCommand::Answer {
        value: FieldValue::from_input(value),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Collecting and creating
// ════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn partial_start_asks_only_the_next_missing_field() {
    let app = App::new();

    let response = app
        .send(start(FlowType::Expense, &[("value", "150"), ("description", "Diesel")]))
        .await;

    assert_eq!(response.outcome, FlowOutcome::Prompted { field: "category".into() });
    assert!(response.interactive, "category is asked with a menu");
    let registration = app.registration().await;
    assert_eq!(registration.phase(), RegistrationPhase::FieldWait);
    assert_eq!(registration.awaiting_input_for_field.as_deref(), Some("category"));
    assert_eq!(app.channel.sent().await.len(), 1);
}

#[tokio::test]
async fn answers_fill_fields_until_the_record_is_created() {
    let app = App::new();
    app.intents
        .append(&user(), IntentEntry::new("register_expense"))
        .await
        .unwrap();

    app.send(start(FlowType::Expense, &[("value", "150"), ("description", "Diesel")]))
        .await;
    let asked_date = app.send(answer("Fuel")).await;
    assert_eq!(asked_date.outcome, FlowOutcome::Prompted { field: "payment_date".into() });

    let created = app.send(answer("31/05/2024")).await;

    let record_id = match &created.outcome {
        FlowOutcome::Created { record_id } => record_id.clone(),
        other => panic!("expected a created record, got {:?}", other),
    };
    let stored = app.records.get(&record_id).await.unwrap();
    assert_eq!(stored.flow_type, FlowType::Expense);
    assert_eq!(stored.payload["value"], json!(150.0));
    assert_eq!(stored.payload["categoryId"], json!("fuel"));
    assert_eq!(stored.payload["paymentDate"], json!("2024-05-31"));

    let registration = app.registration().await;
    assert_eq!(registration.phase(), RegistrationPhase::Completed);
    assert_eq!(registration.last_created_record_id, Some(record_id));
    assert!(registration.completed_draft_snapshot.is_some());
    assert!(app.intents.recent(&user(), 10).await.unwrap().is_empty());

    let last = app.channel.last().await.unwrap();
    assert_eq!(last.choice_ids(), vec![CHOICE_EDIT, CHOICE_DELETE]);
}

#[tokio::test]
async fn confirm_with_missing_field_asks_for_it() {
    let app = App::new();
    app.send(start(FlowType::Death, &[("quantity", "2"), ("animal_category", "Calves")]))
        .await;

    let response = app.send(FlowCommand::Confirm).await;

    assert_eq!(response.outcome, FlowOutcome::Prompted { field: "cause".into() });
    assert!(app.records.is_empty().await);
}

#[tokio::test]
async fn invalid_value_is_reasked_with_its_reason() {
    let app = App::new();
    app.send(start(FlowType::Death, &[])).await;

    let response = app.send(answer("-4")).await;

    assert_eq!(response.outcome, FlowOutcome::Prompted { field: "quantity".into() });
    assert!(response.message.contains("How many animals died?"));
    assert_eq!(app.registration().await.awaiting_input_for_field.as_deref(), Some("quantity"));
}

// ════════════════════════════════════════════════════════════════════════════
// After completion
// ════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn change_after_completion_starts_a_new_registration() {
    let app = App::new();
    let first = app.registered_expense().await;
    let first_session = app.registration().await.session_id;

    let response = app
        .send(FlowCommand::Change {
            field: "value".to_string(),
            value: Some(FieldValue::Number(99.0)),
        })
        .await;

    assert_eq!(response.outcome, FlowOutcome::Prompted { field: "category".into() });
    let registration = app.registration().await;
    assert_ne!(registration.session_id, first_session);
    assert_eq!(registration.last_created_record_id, None);
    assert_eq!(app.records.get(&first).await.unwrap().payload["value"], json!(150.0));
}

#[tokio::test]
async fn edit_without_record_changes_nothing() {
    let app = App::new();
    app.send(start(FlowType::Expense, &[("value", "10")])).await;
    let before = app.registration().await;

    let response = app.send(FlowCommand::Edit).await;

    assert_eq!(response.outcome, FlowOutcome::NotFound);
    assert_eq!(app.registration().await, before);
}

#[tokio::test]
async fn edit_fields_update_the_record_in_place() {
    let app = App::new();
    let record_id = app.registered_expense().await;

    let response = app
        .send(FlowCommand::EditFields {
            updates: raw(&[("value", "180"), ("colour", "red")]),
        })
        .await;

    assert_eq!(response.outcome, FlowOutcome::Updated { record_id: record_id.clone() });
    assert_eq!(app.records.len().await, 1);
    assert_eq!(app.records.get(&record_id).await.unwrap().payload["value"], json!(180.0));
    let registration = app.registration().await;
    assert!(!registration.edit_mode);
    assert_eq!(registration.phase(), RegistrationPhase::Completed);
}

#[tokio::test]
async fn reopened_field_is_updated_by_the_next_answer() {
    let app = App::new();
    let record_id = app.registered_expense().await;

    let reopened = app
        .send(FlowCommand::Change {
            field: "description".to_string(),
            value: None,
        })
        .await;
    assert_eq!(reopened.outcome, FlowOutcome::Prompted { field: "description".into() });
    assert_eq!(app.registration().await.phase(), RegistrationPhase::FieldEditWait);

    let updated = app.send(answer("Diesel and oil")).await;

    assert_eq!(updated.outcome, FlowOutcome::Updated { record_id: record_id.clone() });
    assert_eq!(
        app.records.get(&record_id).await.unwrap().payload["description"],
        json!("Diesel and oil")
    );
}

#[tokio::test]
async fn unknown_field_change_lists_valid_fields() {
    let app = App::new();
    app.registered_expense().await;

    let response = app
        .send(FlowCommand::Change {
            field: "colour".to_string(),
            value: Some(FieldValue::text("red")),
        })
        .await;

    assert_eq!(response.outcome, FlowOutcome::InvalidField { field: "colour".into() });
    assert!(response.message.contains("• Payment date"));
}

#[tokio::test]
async fn failed_update_offers_recovery_and_keeps_edit_mode() {
    let app = App::new();
    app.registered_expense().await;
    app.records.fail_updates(true);

    let response = app
        .send(FlowCommand::EditFields {
            updates: raw(&[("value", "200")]),
        })
        .await;

    assert!(response.is_failure());
    assert!(app.registration().await.edit_mode);
    assert_eq!(
        app.channel.last().await.unwrap().choice_ids(),
        vec![CHOICE_EDIT, CHOICE_CANCEL]
    );
}

// ════════════════════════════════════════════════════════════════════════════
// Delete, cancel and routing
// ════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn delete_removes_record_and_resets_session() {
    let app = App::new();
    let record_id = app.registered_expense().await;

    let response = app.send(FlowCommand::Delete).await;

    assert_eq!(response.outcome, FlowOutcome::Deleted { record_id: record_id.clone() });
    assert!(app.records.get(&record_id).await.is_none());
    assert_eq!(app.registration().await.phase(), RegistrationPhase::Inactive);
    assert_eq!(app.draft(FlowType::Expense).await, None);

    let after = app.router.handle(&ctx(), FlowCommand::Delete).await;
    assert!(matches!(after, Err(RouterError::NoActiveRegistration)));
}

#[tokio::test]
async fn cancel_discards_the_draft() {
    let app = App::new();
    app.send(start(FlowType::Death, &[("quantity", "3")])).await;

    let response = app.send(FlowCommand::Cancel).await;

    assert_eq!(response.outcome, FlowOutcome::Cancelled);
    assert_eq!(app.draft(FlowType::Death).await, None);
    assert_eq!(app.registration().await.phase(), RegistrationPhase::Inactive);
}

#[tokio::test]
async fn starting_another_flow_discards_the_previous_draft() {
    let app = App::new();
    app.send(start(FlowType::Expense, &[("value", "150")])).await;
    assert!(app.draft(FlowType::Expense).await.is_some());

    let response = app.send(start(FlowType::Death, &[("quantity", "1")])).await;

    assert_eq!(response.outcome, FlowOutcome::Prompted { field: "animal_category".into() });
    assert_eq!(app.draft(FlowType::Expense).await, None);
    assert!(app.registration().await.is_for(FlowType::Death));
}

#[tokio::test]
async fn denied_flow_keeps_the_active_one() {
    let gate = AccessGate::new(AccessControlConfig {
        allowed_plan_ids: vec!["pro".to_string()],
        denied_message: "Expenses need the pro plan.".to_string(),
        ..AccessControlConfig::default()
    });
    let app = App::with_expense_gate(gate);
    let free = ctx().with_plan(PlanContext::new(Some("free".into()), None));
    app.send_as(&free, start(FlowType::Death, &[("quantity", "1")])).await;

    let response = app.send_as(&free, start(FlowType::Expense, &[("value", "5")])).await;

    assert_eq!(response.outcome, FlowOutcome::Denied);
    assert_eq!(response.message, "Expenses need the pro plan.");
    assert!(app.registration().await.is_for(FlowType::Death));
    assert!(app.draft(FlowType::Death).await.is_some());
    assert_eq!(app.draft(FlowType::Expense).await, None);
}

#[tokio::test]
async fn unregistered_flow_is_rejected() {
    let app = App::new();

    let result = app.router.handle(&ctx(), start(FlowType::Birth, &[])).await;

    assert!(matches!(result, Err(RouterError::UnknownFlow(FlowType::Birth))));
}
