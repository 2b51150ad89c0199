//! Generic registration engine.
//!
//! `FlowEngine<D>` drives one flow type through collecting, confirmation,
//! creation, editing and deletion. Everything domain specific comes from the
//! injected [`DomainService`] and [`FieldPrompts`]; the engine itself only
//! knows the session sub-state (`activeRegistration`) and the phase machine.
//!
//! Public operations never fail: infrastructure errors are logged and turned
//! into a user-facing message plus an edit/cancel recovery prompt.

mod collecting;
mod editing;
mod hooks;
mod lifecycle;


pub use hooks::{CompletionHook, DraftHook, FlowHooks};

use std::sync::Arc;

use crate::domain::foundation::{StateMachine, UserId};
use crate::domain::registration::{
    AccessGate, AccessResult, ActiveRegistration, Choice, FlowContext, FlowMessages, FlowOutcome,
    FlowResponse, FlowType, RegistrationPhase, ServiceError, SessionPatch, SnapshotError,
};
use crate::ports::{
    ChannelError, DomainService, FieldPrompts, IntentHistory, MessagingChannel, SessionStore,
    SessionStoreError,
};

/// Internal failure of an engine step.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Session(#[from] SessionStoreError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("Failed to encode registration state: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Everything that makes a flow a particular flow.
pub struct FlowDefinition<D: DomainService> {
    pub service: Arc<D>,
    pub prompts: Arc<dyn FieldPrompts<D>>,
    pub messages: FlowMessages,
    pub gate: AccessGate,
    pub hooks: FlowHooks<D>,
}

impl<D: DomainService> FlowDefinition<D> {
    pub fn new(service: Arc<D>, prompts: Arc<dyn FieldPrompts<D>>) -> Self {
        Self {
            service,
            prompts,
            messages: FlowMessages::default(),
            gate: AccessGate::open(),
            hooks: FlowHooks::default(),
        }
    }

    pub fn with_messages(mut self, messages: FlowMessages) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_gate(mut self, gate: AccessGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_hooks(mut self, hooks: FlowHooks<D>) -> Self {
        self.hooks = hooks;
        self
    }
}

/// Infrastructure shared by every flow.
#[derive(Clone)]
pub struct FlowPorts {
    pub sessions: Arc<dyn SessionStore>,
    pub channel: Arc<dyn MessagingChannel>,
    pub intents: Arc<dyn IntentHistory>,
}

pub struct FlowEngine<D: DomainService> {
    service: Arc<D>,
    prompts: Arc<dyn FieldPrompts<D>>,
    messages: FlowMessages,
    gate: AccessGate,
    hooks: FlowHooks<D>,
    sessions: Arc<dyn SessionStore>,
    channel: Arc<dyn MessagingChannel>,
    intents: Arc<dyn IntentHistory>,
}

impl<D: DomainService> FlowEngine<D> {
    pub fn new(definition: FlowDefinition<D>, ports: FlowPorts) -> Self {
        Self {
            service: definition.service,
            prompts: definition.prompts,
            messages: definition.messages,
            gate: definition.gate,
            hooks: definition.hooks,
            sessions: ports.sessions,
            channel: ports.channel,
            intents: ports.intents,
        }
    }

    pub fn flow_type(&self) -> FlowType {
        self.service.flow_type()
    }

    pub fn service(&self) -> &Arc<D> {
        &self.service
    }

    pub fn messages(&self) -> &FlowMessages {
        &self.messages
    }

    pub fn admits(&self, ctx: &FlowContext) -> bool {
        self.gate.check(&ctx.plan).is_allowed()
    }

    // ════════════════════════════════════════════════════════════════════════
    // Session sub-state
    // ════════════════════════════════════════════════════════════════════════

    /// Reads `activeRegistration`; a missing session reads as inactive.
    pub(crate) async fn load_registration(
        &self,
        user_id: &UserId,
    ) -> Result<ActiveRegistration, FlowError> {
        let Some(state) = self.sessions.get(user_id).await? else {
            return Ok(ActiveRegistration::default());
        };
        let registration = state
            .active_registration()
            .map_err(|e| SessionStoreError::Corrupt(e.to_string()))?;
        Ok(registration.unwrap_or_default())
    }

    /// Writes `activeRegistration`, logging the phase change it implies.
    pub(crate) async fn save_registration(
        &self,
        user_id: &UserId,
        from: RegistrationPhase,
        registration: &ActiveRegistration,
    ) -> Result<(), FlowError> {
        debug_assert!(registration.is_consistent());
        let to = registration.phase();
        if from != to {
            if from.can_transition_to(&to) {
                tracing::debug!(
                    user_id = %user_id,
                    flow = %self.flow_type(),
                    %from,
                    %to,
                    "Registration phase changed"
                );
            } else {
                tracing::warn!(
                    user_id = %user_id,
                    flow = %self.flow_type(),
                    %from,
                    %to,
                    "Unexpected registration phase change"
                );
            }
        }
        self.sessions
            .set(user_id, SessionPatch::active_registration(registration)?)
            .await?;
        Ok(())
    }

    pub(crate) async fn reset_registration(
        &self,
        user_id: &UserId,
        from: RegistrationPhase,
    ) -> Result<(), FlowError> {
        self.save_registration(user_id, from, &ActiveRegistration::default())
            .await
    }

    // ════════════════════════════════════════════════════════════════════════
    // Access
    // ════════════════════════════════════════════════════════════════════════

    /// Evaluates the access gate once; `Some` is the terminal deny response.
    async fn deny_if_needed(&self, ctx: &FlowContext) -> Result<Option<FlowResponse>, FlowError> {
        let AccessResult::Denied(reason) = self.gate.check(&ctx.plan) else {
            return Ok(None);
        };
        let user_id = &ctx.user_id;
        tracing::info!(
            user_id = %user_id,
            flow = %self.flow_type(),
            reason = %reason,
            "Registration denied by access gate"
        );

        if self.gate.resets_on_deny() {
            let registration = self.load_registration(user_id).await?;
            if registration.is_for(self.flow_type()) {
                self.reset_registration(user_id, registration.phase()).await?;
            }
        }

        Ok(Some(FlowResponse::text(
            self.gate.denied_message(),
            FlowOutcome::Denied,
        )))
    }

    // ════════════════════════════════════════════════════════════════════════
    // Outbound messages
    // ════════════════════════════════════════════════════════════════════════

    /// Sends an informational message; failures are logged and swallowed.
    async fn notify(&self, user_id: &UserId, text: &str) {
        if let Err(e) = self.channel.send_text(user_id, text).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to send message");
        }
    }

    async fn offer(&self, user_id: &UserId, body: &str, choices: &[Choice]) {
        if let Err(e) = self.channel.send_choices(user_id, body, choices).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to send choices");
        }
    }

    /// Offers edit/delete after a record was created or updated.
    async fn offer_record_options(&self, user_id: &UserId) {
        let choices = self.messages.record_choices();
        self.offer(user_id, &self.messages.options_prompt, &choices)
            .await;
    }

    /// Sends `message` followed by the edit/cancel recovery prompt.
    async fn send_recovery(&self, user_id: &UserId, message: &str) {
        self.notify(user_id, message).await;
        let choices = self.messages.recovery_choices();
        self.offer(user_id, &self.messages.error_recovery_prompt, &choices)
            .await;
    }

    /// Reports a failed external call and leaves the state for retry.
    async fn service_failed(&self, ctx: &FlowContext, err: &ServiceError) -> FlowResponse {
        let message = self.service.handle_service_error(err);
        self.send_recovery(&ctx.user_id, &message).await;
        FlowResponse::new(message, true, FlowOutcome::Failed)
    }

    /// Last-resort conversion of a failed step into a response.
    async fn recover(&self, ctx: &FlowContext, operation: &str, err: FlowError) -> FlowResponse {
        tracing::warn!(
            user_id = %ctx.user_id,
            flow = %self.flow_type(),
            operation,
            error = %err,
            "Registration step failed"
        );
        let service_err = match err {
            FlowError::Service(e) => e,
            other => ServiceError::Unavailable(other.to_string()),
        };
        self.service_failed(ctx, &service_err).await
    }

    // ════════════════════════════════════════════════════════════════════════
    // Helpers
    // ════════════════════════════════════════════════════════════════════════

    async fn summarize(&self, draft: &D::Draft) -> String {
        match self.service.build_natural_summary(draft).await {
            Some(summary) => summary,
            None => self.service.build_draft_summary(draft),
        }
    }

    /// Best-effort; failures are only logged.
    async fn clear_intent_history(&self, user_id: &UserId) {
        if let Err(e) = self.intents.clear(user_id).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to clear intent history");
        }
    }
}
