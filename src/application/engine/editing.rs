//! Editing a created record: edit mode, snapshot restore and in-place updates.

use super::{FlowEngine, FlowError};
use crate::domain::foundation::{RecordId, UserId};
use crate::domain::registration::{
    ActiveRegistration, DraftSnapshot, FieldName, FieldUpdates, FieldValue, FlowContext, FlowDraft,
    FlowOutcome, FlowResponse, RegistrationStatus, ServiceError,
};
use crate::ports::DomainService;

/// A registration opened for editing; its draft is live again in the store.
struct OpenedRecord {
    registration: ActiveRegistration,
    record_id: RecordId,
}

impl<D: DomainService> FlowEngine<D> {
    /// Enters edit mode for the most recently created record.
    ///
    /// Without a known record id nothing is mutated and a "not found"
    /// response is returned.
    pub async fn enter_edit_mode(&self, ctx: &FlowContext) -> FlowResponse {
        match self.try_enter_edit_mode(ctx).await {
            Ok(response) => response,
            Err(e) => self.recover(ctx, "enter_edit_mode", e).await,
        }
    }

    /// Changes one field, with or without a value.
    ///
    /// Without a value, the field editor asks for one and the field becomes
    /// awaited. With a value:
    /// - in edit mode the existing record is updated in place
    /// - on a completed registration outside edit mode a new registration
    ///   starts, prefilled with the value
    /// - while collecting the value is merged like any other
    pub async fn change_registration_field(
        &self,
        ctx: &FlowContext,
        field: D::Field,
        value: Option<FieldValue>,
    ) -> FlowResponse {
        let result = match self.deny_if_needed(ctx).await {
            Ok(Some(denied)) => Ok(denied),
            Ok(None) => match value {
                Some(value) => self.change_registration_with_value(ctx, field, value).await,
                None => self.change_without_value(ctx, field).await,
            },
            Err(e) => Err(e),
        };
        match result {
            Ok(response) => response,
            Err(e) => self.recover(ctx, "change_registration_field", e).await,
        }
    }

    /// Applies edits to the created record, entering edit mode when needed.
    pub async fn apply_record_updates(
        &self,
        ctx: &FlowContext,
        updates: FieldUpdates<D::Field>,
    ) -> FlowResponse {
        match self.try_apply_record_updates(ctx, updates).await {
            Ok(response) => response,
            Err(e) => self.recover(ctx, "apply_record_updates", e).await,
        }
    }

    /// Replaces one field of the created record.
    pub async fn edit_record_field(
        &self,
        ctx: &FlowContext,
        field: D::Field,
        value: FieldValue,
    ) -> FlowResponse {
        self.apply_record_updates(ctx, FieldUpdates::single(field, value))
            .await
    }

    /// Makes the registration's completed snapshot the live draft again.
    ///
    /// Returns the restored draft, or `None` when there is no snapshot for
    /// this flow.
    pub async fn restore_completed_draft_snapshot(
        &self,
        user_id: &UserId,
    ) -> Result<Option<D::Draft>, FlowError> {
        let registration = self.load_registration(user_id).await?;
        self.restore_snapshot(user_id, &registration).await
    }

    /// Record id of the last created record: session first, then the
    /// snapshot, then the persisted draft.
    pub async fn resolve_record_id(
        &self,
        user_id: &UserId,
        registration: &ActiveRegistration,
    ) -> Option<RecordId> {
        if registration.is_for(self.flow_type()) {
            if let Some(record_id) = &registration.last_created_record_id {
                return Some(record_id.clone());
            }
            if let Some(record_id) = registration
                .completed_draft_snapshot
                .as_ref()
                .and_then(|snapshot| snapshot.record_id::<D::Draft>())
            {
                return Some(record_id);
            }
        }

        match self.service.load_draft(user_id).await {
            Ok(draft) => draft.record_id().cloned(),
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    flow = %self.flow_type(),
                    error = %e,
                    "Failed to read draft while resolving record id"
                );
                None
            }
        }
    }

    async fn try_enter_edit_mode(&self, ctx: &FlowContext) -> Result<FlowResponse, FlowError> {
        let user_id = &ctx.user_id;
        let registration = self.load_registration(user_id).await?;
        let from = registration.phase();

        let Some(opened) = self.open_for_edit(user_id, registration).await? else {
            return Ok(self.record_not_found());
        };
        self.save_registration(user_id, from, &opened.registration)
            .await?;

        tracing::info!(
            user_id = %user_id,
            flow = %self.flow_type(),
            record_id = %opened.record_id,
            "Entered edit mode"
        );

        let intro = self.messages.edit_intro_with_examples();
        self.notify(user_id, &intro).await;
        Ok(FlowResponse::new(
            intro,
            true,
            FlowOutcome::EditModeEntered {
                record_id: opened.record_id,
            },
        ))
    }

    async fn change_registration_with_value(
        &self,
        ctx: &FlowContext,
        field: D::Field,
        value: FieldValue,
    ) -> Result<FlowResponse, FlowError> {
        let user_id = &ctx.user_id;
        let mut registration = self.load_registration(user_id).await?;
        let updates = FieldUpdates::single(field, value);

        let starts_new = !registration.is_for(self.flow_type())
            || (registration.phase().has_record() && !registration.edit_mode);
        if starts_new {
            if registration.is_for(self.flow_type()) {
                tracing::info!(
                    user_id = %user_id,
                    flow = %self.flow_type(),
                    field = field.as_str(),
                    "Change after completion starts a new registration"
                );
            }
            return self.start_admitted(ctx, updates).await;
        }

        let from = registration.phase();
        registration.take_awaiting();

        if registration.edit_mode {
            self.restore_snapshot(user_id, &registration).await?;
            self.save_registration(user_id, from, &registration).await?;
            return self.apply_to_record(ctx, registration, updates).await;
        }

        self.save_registration(user_id, from, &registration).await?;
        self.collect(ctx, registration, updates).await
    }

    async fn change_without_value(
        &self,
        ctx: &FlowContext,
        field: D::Field,
    ) -> Result<FlowResponse, FlowError> {
        let user_id = &ctx.user_id;
        let registration = self.load_registration(user_id).await?;
        let from = registration.phase();

        let owned = registration.is_for(self.flow_type());
        let mut registration = if owned && registration.phase().has_record() {
            match self.open_for_edit(user_id, registration).await? {
                Some(opened) => opened.registration,
                None => return Ok(self.record_not_found()),
            }
        } else if owned {
            registration
        } else {
            return Ok(self.record_not_found());
        };

        let prompt = self.prompts.ask_edit(user_id, field).await?;
        registration.await_field(field.as_str());
        self.save_registration(user_id, from, &registration).await?;

        Ok(FlowResponse::prompted(
            field.as_str(),
            prompt.message,
            prompt.interactive,
        ))
    }

    async fn try_apply_record_updates(
        &self,
        ctx: &FlowContext,
        updates: FieldUpdates<D::Field>,
    ) -> Result<FlowResponse, FlowError> {
        let user_id = &ctx.user_id;
        let registration = self.load_registration(user_id).await?;
        let from = registration.phase();

        let registration = if registration.edit_mode && registration.is_for(self.flow_type()) {
            let mut registration = registration;
            registration.take_awaiting();
            self.restore_snapshot(user_id, &registration).await?;
            registration
        } else {
            match self.open_for_edit(user_id, registration).await? {
                Some(opened) => opened.registration,
                None => return Ok(self.record_not_found()),
            }
        };
        self.save_registration(user_id, from, &registration).await?;

        self.apply_to_record(ctx, registration, updates).await
    }

    /// Merges `updates` into the live draft and pushes them to the record.
    pub(super) async fn apply_to_record(
        &self,
        ctx: &FlowContext,
        registration: ActiveRegistration,
        updates: FieldUpdates<D::Field>,
    ) -> Result<FlowResponse, FlowError> {
        let user_id = &ctx.user_id;
        let Some(record_id) = self.resolve_record_id(user_id, &registration).await else {
            return Ok(self.record_not_found());
        };

        if updates.is_empty() {
            let intro = self.messages.edit_intro_with_examples();
            return Ok(FlowResponse::text(
                intro,
                FlowOutcome::EditModeEntered { record_id },
            ));
        }

        let draft = match self.service.update_draft(user_id, &updates).await {
            Ok(draft) => draft,
            Err(ServiceError::Validation { field, reason }) => {
                return self
                    .reprompt_invalid(ctx, registration, &field, &reason, true)
                    .await;
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Draft update failed during edit");
                return Ok(self.service_failed(ctx, &e).await);
            }
        };

        self.finalize_edit_operation(ctx, registration, record_id, draft, &updates)
            .await
    }

    /// Pushes the edited draft to the record API and refreshes the snapshot.
    ///
    /// On failure the registration stays in edit mode so the user can retry.
    async fn finalize_edit_operation(
        &self,
        ctx: &FlowContext,
        mut registration: ActiveRegistration,
        record_id: RecordId,
        mut draft: D::Draft,
        updates: &FieldUpdates<D::Field>,
    ) -> Result<FlowResponse, FlowError> {
        let user_id = &ctx.user_id;
        let from = registration.phase();
        draft.set_record_id(Some(record_id.clone()));
        self.service.save_draft(user_id, &draft).await?;

        if let Err(e) = self
            .service
            .update(user_id, &record_id, &draft, updates)
            .await
        {
            tracing::warn!(
                user_id = %user_id,
                flow = %self.flow_type(),
                record_id = %record_id,
                error = %e,
                "Record update failed"
            );
            return Ok(self.service_failed(ctx, &e).await);
        }

        draft.set_status(RegistrationStatus::Completed);
        let summary = self.summarize(&draft).await;
        let snapshot = DraftSnapshot::capture(&draft)?;
        registration.mark_completed(record_id.clone(), snapshot);
        registration.leave_edit_mode();
        self.save_registration(user_id, from, &registration).await?;
        self.persist_completed_draft(user_id, &draft).await;

        tracing::info!(
            user_id = %user_id,
            flow = %self.flow_type(),
            record_id = %record_id,
            fields = updates.len(),
            "Record updated"
        );

        let message = self.messages.updated_with(&summary);
        self.notify(user_id, &message).await;
        self.offer_record_options(user_id).await;

        Ok(FlowResponse::new(
            message,
            true,
            FlowOutcome::Updated { record_id },
        ))
    }

    /// Restores the snapshot into the draft store when one exists for this flow.
    /// The live draft is collecting again until the edit is finalized.
    async fn restore_snapshot(
        &self,
        user_id: &UserId,
        registration: &ActiveRegistration,
    ) -> Result<Option<D::Draft>, FlowError> {
        if !registration.is_for(self.flow_type()) {
            return Ok(None);
        }
        let Some(snapshot) = &registration.completed_draft_snapshot else {
            return Ok(None);
        };
        if !registration.snapshot_is_current() {
            tracing::debug!(
                user_id = %user_id,
                flow = %self.flow_type(),
                "Restoring snapshot taken under another correlation id"
            );
        }
        let mut draft: D::Draft = snapshot.restore()?;
        draft.set_status(RegistrationStatus::Collecting);
        self.service.save_draft(user_id, &draft).await?;
        Ok(Some(draft))
    }

    /// Puts the registration into edit mode for its record, or `None` when no
    /// record id is known. Nothing is written to the session.
    async fn open_for_edit(
        &self,
        user_id: &UserId,
        registration: ActiveRegistration,
    ) -> Result<Option<OpenedRecord>, FlowError> {
        let Some(record_id) = self.resolve_record_id(user_id, &registration).await else {
            return Ok(None);
        };

        let draft = match self.restore_snapshot(user_id, &registration).await? {
            Some(draft) => draft,
            None => {
                // no snapshot: the persisted draft of this flow becomes the baseline
                let mut draft = self.service.load_draft(user_id).await?;
                draft.set_record_id(Some(record_id.clone()));
                draft.set_status(RegistrationStatus::Collecting);
                self.service.save_draft(user_id, &draft).await?;
                draft
            }
        };

        let mut registration = if registration.is_for(self.flow_type()) {
            registration
        } else {
            ActiveRegistration::fresh(self.flow_type())
        };
        if registration.completed_draft_snapshot.is_none() {
            let mut baseline = draft.clone();
            baseline.set_status(RegistrationStatus::Completed);
            registration.completed_draft_snapshot = Some(DraftSnapshot::capture(&baseline)?);
            registration.snapshot_session_id = registration.session_id;
        }
        registration.status = RegistrationStatus::Completed;
        registration.enter_edit_mode(record_id.clone());

        Ok(Some(OpenedRecord {
            registration,
            record_id,
        }))
    }

    fn record_not_found(&self) -> FlowResponse {
        FlowResponse::text(&self.messages.record_not_found, FlowOutcome::NotFound)
    }
}
