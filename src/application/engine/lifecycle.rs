//! Ending a registration: deleting its record, cancelling, discarding.

use super::{FlowEngine, FlowError};
use crate::domain::foundation::UserId;
use crate::domain::registration::{FlowContext, FlowOutcome, FlowResponse, RegistrationPhase};
use crate::ports::DomainService;

impl<D: DomainService> FlowEngine<D> {
    /// Deletes the last created record and tidies up after it.
    ///
    /// Cleanup steps after a successful delete are independent: each failure
    /// is logged and the remaining steps still run.
    pub async fn delete_record(&self, ctx: &FlowContext) -> FlowResponse {
        match self.try_delete_record(ctx).await {
            Ok(response) => response,
            Err(e) => self.recover(ctx, "delete_record", e).await,
        }
    }

    /// Abandons the registration. Always succeeds from the user's point of view.
    pub async fn cancel_registration(&self, ctx: &FlowContext) -> FlowResponse {
        let user_id = &ctx.user_id;
        let owned_phase = self.owned_phase(user_id).await;

        if let Err(e) = self.service.clear_draft(user_id).await {
            tracing::warn!(
                user_id = %user_id,
                flow = %self.flow_type(),
                error = %e,
                "Failed to clear draft on cancel"
            );
        }
        if let Some(from) = owned_phase {
            if let Err(e) = self.reset_registration(user_id, from).await {
                tracing::warn!(
                    user_id = %user_id,
                    flow = %self.flow_type(),
                    error = %e,
                    "Failed to reset registration on cancel"
                );
            }
        }

        tracing::info!(user_id = %user_id, flow = %self.flow_type(), "Registration cancelled");

        self.notify(user_id, &self.messages.cancelled).await;
        FlowResponse::new(&self.messages.cancelled, true, FlowOutcome::Cancelled)
    }

    /// Drops this flow's draft without telling the user.
    ///
    /// Used when another flow takes over the session.
    pub async fn discard(&self, user_id: &UserId) {
        match self.service.clear_draft(user_id).await {
            Ok(()) => tracing::debug!(
                user_id = %user_id,
                flow = %self.flow_type(),
                "Draft discarded"
            ),
            Err(e) => tracing::warn!(
                user_id = %user_id,
                flow = %self.flow_type(),
                error = %e,
                "Failed to discard draft"
            ),
        }
    }

    async fn try_delete_record(&self, ctx: &FlowContext) -> Result<FlowResponse, FlowError> {
        let user_id = &ctx.user_id;
        let registration = self.load_registration(user_id).await?;
        let Some(record_id) = self.resolve_record_id(user_id, &registration).await else {
            return Ok(FlowResponse::text(
                &self.messages.record_not_found,
                FlowOutcome::NotFound,
            ));
        };

        if let Err(e) = self.service.delete(user_id, &record_id).await {
            tracing::warn!(
                user_id = %user_id,
                flow = %self.flow_type(),
                record_id = %record_id,
                error = %e,
                "Record deletion failed"
            );
            return Ok(self.service_failed(ctx, &e).await);
        }

        tracing::info!(
            user_id = %user_id,
            flow = %self.flow_type(),
            record_id = %record_id,
            "Record deleted"
        );

        if let Err(e) = self.service.clear_draft(user_id).await {
            tracing::warn!(
                user_id = %user_id,
                flow = %self.flow_type(),
                error = %e,
                "Failed to clear draft after delete"
            );
        }
        self.clear_intent_history(user_id).await;
        if registration.is_for(self.flow_type()) {
            if let Err(e) = self.reset_registration(user_id, registration.phase()).await {
                tracing::warn!(
                    user_id = %user_id,
                    flow = %self.flow_type(),
                    error = %e,
                    "Failed to reset registration after delete"
                );
            }
        }

        self.notify(user_id, &self.messages.deleted).await;
        Ok(FlowResponse::new(
            &self.messages.deleted,
            true,
            FlowOutcome::Deleted { record_id },
        ))
    }

    /// Phase of the registration when it belongs to this flow.
    ///
    /// An unreadable session still counts as ours so the reset overwrites it.
    async fn owned_phase(&self, user_id: &UserId) -> Option<RegistrationPhase> {
        match self.load_registration(user_id).await {
            Ok(registration) if registration.is_for(self.flow_type()) => Some(registration.phase()),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    flow = %self.flow_type(),
                    error = %e,
                    "Failed to read registration on cancel"
                );
                Some(RegistrationPhase::Inactive)
            }
        }
    }
}
