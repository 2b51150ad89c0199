//! Collecting values, asking for the next missing field and creating the record.

use super::hooks::run_draft_hook;
use super::{FlowEngine, FlowError};
use crate::domain::foundation::UserId;
use crate::domain::registration::{
    ActiveRegistration, DraftSnapshot, FieldName, FieldUpdates, FieldValue, FlowContext, FlowDraft,
    FlowOutcome, FlowResponse, RegistrationStatus, RegistrationStep, ServiceError,
};
use crate::ports::DomainService;

impl<D: DomainService> FlowEngine<D> {
    /// Starts (or resumes) a registration, merging any values the user already gave.
    ///
    /// A registration of another flow, or one already completed, is replaced
    /// by a fresh one: the draft is cleared and a new correlation id minted.
    pub async fn start_registration(
        &self,
        ctx: &FlowContext,
        updates: FieldUpdates<D::Field>,
    ) -> FlowResponse {
        let result = match self.deny_if_needed(ctx).await {
            Ok(Some(denied)) => Ok(denied),
            Ok(None) => self.start_admitted(ctx, updates).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(response) => response,
            Err(e) => self.recover(ctx, "start_registration", e).await,
        }
    }

    /// Merges values into the in-progress registration and moves it forward.
    pub async fn continue_registration(
        &self,
        ctx: &FlowContext,
        updates: FieldUpdates<D::Field>,
    ) -> FlowResponse {
        let result = match self.deny_if_needed(ctx).await {
            Ok(Some(denied)) => Ok(denied),
            Ok(None) => self.continue_admitted(ctx, updates).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(response) => response,
            Err(e) => self.recover(ctx, "continue_registration", e).await,
        }
    }

    /// Resolves a bare answer against the field currently awaited.
    pub async fn answer_awaited_field(&self, ctx: &FlowContext, value: FieldValue) -> FlowResponse {
        let awaited = match self.load_registration(&ctx.user_id).await {
            Ok(registration) if registration.is_for(self.flow_type()) => registration
                .awaiting_input_for_field
                .as_deref()
                .and_then(D::Field::parse),
            Ok(_) => None,
            Err(e) => return self.recover(ctx, "answer_awaited_field", e).await,
        };

        let updates = match awaited {
            Some(field) => FieldUpdates::single(field, value),
            None => {
                tracing::debug!(
                    user_id = %ctx.user_id,
                    flow = %self.flow_type(),
                    "Answer received with no field awaited"
                );
                FieldUpdates::new()
            }
        };
        self.continue_registration(ctx, updates).await
    }

    /// Explicit confirmation: creates the record when nothing is missing.
    pub async fn confirm_registration(&self, ctx: &FlowContext) -> FlowResponse {
        let result = match self.deny_if_needed(ctx).await {
            Ok(Some(denied)) => Ok(denied),
            Ok(None) => self.confirm_admitted(ctx).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(response) => response,
            Err(e) => self.recover(ctx, "confirm_registration", e).await,
        }
    }

    pub(super) async fn start_admitted(
        &self,
        ctx: &FlowContext,
        updates: FieldUpdates<D::Field>,
    ) -> Result<FlowResponse, FlowError> {
        let user_id = &ctx.user_id;
        let flow_type = self.flow_type();
        let previous = self.load_registration(user_id).await?;
        let from = previous.phase();
        let resuming = previous.is_for(flow_type) && !previous.is_completed();

        let mut registration = if resuming {
            previous
        } else {
            self.service.clear_draft(user_id).await?;
            ActiveRegistration::fresh(flow_type)
        };
        registration.step = RegistrationStep::Creating;
        registration.status = RegistrationStatus::Collecting;
        registration.edit_mode = false;
        registration.awaiting_input_for_field = None;
        self.save_registration(user_id, from, &registration).await?;

        tracing::info!(
            user_id = %user_id,
            flow = %flow_type,
            resuming,
            fields = updates.len(),
            "Registration started"
        );

        if !resuming {
            let empty = self.service.load_draft(user_id).await?;
            let seeded = run_draft_hook(&self.hooks.on_first_start, user_id, empty).await?;
            if let Some(seeded) = seeded {
                self.service.save_draft(user_id, &seeded).await?;
            }
        }

        self.collect(ctx, registration, updates).await
    }

    async fn continue_admitted(
        &self,
        ctx: &FlowContext,
        updates: FieldUpdates<D::Field>,
    ) -> Result<FlowResponse, FlowError> {
        let user_id = &ctx.user_id;
        let mut registration = self.load_registration(user_id).await?;
        if !registration.is_for(self.flow_type()) {
            return self.start_admitted(ctx, updates).await;
        }
        if registration.is_completed() && !registration.edit_mode {
            if updates.is_empty() {
                tracing::debug!(
                    user_id = %user_id,
                    flow = %self.flow_type(),
                    "No values after completion, keeping the created record"
                );
                return Ok(FlowResponse::text(
                    &self.messages.already_completed,
                    FlowOutcome::AlreadyCompleted,
                ));
            }
            // values after completion describe a new record
            return self.start_admitted(ctx, updates).await;
        }

        let from = registration.phase();
        registration.take_awaiting();
        self.save_registration(user_id, from, &registration).await?;

        if registration.is_completed() {
            return self.apply_to_record(ctx, registration, updates).await;
        }
        self.collect(ctx, registration, updates).await
    }

    async fn confirm_admitted(&self, ctx: &FlowContext) -> Result<FlowResponse, FlowError> {
        let user_id = &ctx.user_id;
        let mut registration = self.load_registration(user_id).await?;
        if !registration.is_for(self.flow_type()) {
            return Ok(FlowResponse::text(
                &self.messages.nothing_to_confirm,
                FlowOutcome::NothingToConfirm,
            ));
        }
        if registration.is_completed() {
            return Ok(FlowResponse::text(
                &self.messages.already_completed,
                FlowOutcome::AlreadyCompleted,
            ));
        }

        let from = registration.phase();
        registration.take_awaiting();
        self.save_registration(user_id, from, &registration).await?;

        let draft = self.service.load_draft(user_id).await?;
        let missing = self.service.has_missing_fields(&draft);
        if let Some(field) = missing.first().copied() {
            tracing::info!(
                user_id = %user_id,
                flow = %self.flow_type(),
                missing = ?missing,
                "Confirmation requested with missing fields"
            );
            self.notify(user_id, &self.messages.missing_data_during_confirm)
                .await;
            return self.prompt_missing(ctx, registration, field, draft).await;
        }

        self.present_confirmation(ctx, registration, draft).await
    }

    /// Merges `updates` (if any) and asks for the next missing field or completes.
    pub(super) async fn collect(
        &self,
        ctx: &FlowContext,
        registration: ActiveRegistration,
        updates: FieldUpdates<D::Field>,
    ) -> Result<FlowResponse, FlowError> {
        let user_id = &ctx.user_id;
        let draft = if updates.is_empty() {
            self.service.load_draft(user_id).await?
        } else {
            match self.service.update_draft(user_id, &updates).await {
                Ok(draft) => draft,
                Err(ServiceError::Validation { field, reason }) => {
                    return self
                        .reprompt_invalid(ctx, registration, &field, &reason, false)
                        .await;
                }
                Err(e) => return Err(e.into()),
            }
        };
        self.ask_next_or_complete(ctx, registration, draft).await
    }

    async fn ask_next_or_complete(
        &self,
        ctx: &FlowContext,
        registration: ActiveRegistration,
        draft: D::Draft,
    ) -> Result<FlowResponse, FlowError> {
        match self.service.has_missing_fields(&draft).first().copied() {
            Some(field) => self.prompt_missing(ctx, registration, field, draft).await,
            None => self.present_confirmation(ctx, registration, draft).await,
        }
    }

    /// Asks for exactly one missing field and marks it as awaited.
    pub(super) async fn prompt_missing(
        &self,
        ctx: &FlowContext,
        mut registration: ActiveRegistration,
        field: D::Field,
        draft: D::Draft,
    ) -> Result<FlowResponse, FlowError> {
        let user_id = &ctx.user_id;
        let from = registration.phase();
        let asked = self.prompts.ask_missing(user_id, field, &draft).await?;
        if let Some(adjusted) = &asked.draft {
            self.service.save_draft(user_id, adjusted).await?;
        }

        registration.await_field(field.as_str());
        self.save_registration(user_id, from, &registration).await?;

        tracing::debug!(
            user_id = %user_id,
            flow = %self.flow_type(),
            field = field.as_str(),
            "Asked for missing field"
        );
        Ok(FlowResponse::prompted(
            field.as_str(),
            asked.prompt.message,
            asked.prompt.interactive,
        ))
    }

    /// Re-asks a field whose value was rejected, prefixing the rejection reason.
    pub(super) async fn reprompt_invalid(
        &self,
        ctx: &FlowContext,
        mut registration: ActiveRegistration,
        field_name: &str,
        reason: &str,
        editing: bool,
    ) -> Result<FlowResponse, FlowError> {
        let user_id = &ctx.user_id;
        let Some(field) = D::Field::parse(field_name) else {
            return Err(ServiceError::validation(field_name, reason).into());
        };
        tracing::info!(
            user_id = %user_id,
            flow = %self.flow_type(),
            field = field.as_str(),
            reason,
            "Rejected field value"
        );

        let prompt = if editing {
            self.prompts.ask_edit(user_id, field).await?
        } else {
            let draft = self.service.load_draft(user_id).await?;
            self.prompts.ask_missing(user_id, field, &draft).await?.prompt
        };

        let from = registration.phase();
        registration.await_field(field.as_str());
        self.save_registration(user_id, from, &registration).await?;

        Ok(FlowResponse::prompted(
            field.as_str(),
            format!("{}\n\n{}", reason, prompt.message),
            prompt.interactive,
        ))
    }

    /// Runs the pre-confirmation hook, then creates the record.
    pub(super) async fn present_confirmation(
        &self,
        ctx: &FlowContext,
        registration: ActiveRegistration,
        draft: D::Draft,
    ) -> Result<FlowResponse, FlowError> {
        let user_id = &ctx.user_id;
        let hooked = run_draft_hook(&self.hooks.before_confirmation, user_id, draft.clone()).await?;
        let draft = match hooked {
            Some(adjusted) => {
                self.service.save_draft(user_id, &adjusted).await?;
                adjusted
            }
            None => draft,
        };
        self.create_record(ctx, registration, draft).await
    }

    async fn create_record(
        &self,
        ctx: &FlowContext,
        mut registration: ActiveRegistration,
        mut draft: D::Draft,
    ) -> Result<FlowResponse, FlowError> {
        let user_id = &ctx.user_id;
        let from = registration.phase();
        let summary = self.summarize(&draft).await;

        let record_id = match self.service.create(user_id, &draft).await {
            Ok(record_id) => record_id,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    flow = %self.flow_type(),
                    error = %e,
                    "Record creation failed"
                );
                return Ok(self.service_failed(ctx, &e).await);
            }
        };

        draft.set_record_id(Some(record_id.clone()));
        draft.set_status(RegistrationStatus::Completed);
        let snapshot = DraftSnapshot::capture(&draft)?;

        // The session is the authoritative link to the new record.
        registration.edit_mode = false;
        registration.mark_completed(record_id.clone(), snapshot);
        self.save_registration(user_id, from, &registration).await?;
        self.persist_completed_draft(user_id, &draft).await;

        self.clear_intent_history(user_id).await;

        tracing::info!(
            user_id = %user_id,
            flow = %self.flow_type(),
            record_id = %record_id,
            "Record created"
        );

        let message = self.messages.created_with(&summary);
        self.notify(user_id, &message).await;
        self.offer_record_options(user_id).await;

        if let Some(hook) = &self.hooks.after_completion {
            hook(user_id.clone(), record_id.clone()).await;
        }

        Ok(FlowResponse::new(
            message,
            true,
            FlowOutcome::Created { record_id },
        ))
    }

    /// Stores the completed draft; the snapshot in the session still covers a failure.
    pub(super) async fn persist_completed_draft(&self, user_id: &UserId, draft: &D::Draft) {
        if let Err(e) = self.service.save_draft(user_id, draft).await {
            tracing::warn!(
                user_id = %user_id,
                flow = %self.flow_type(),
                error = %e,
                "Failed to persist completed draft"
            );
        }
    }
}
