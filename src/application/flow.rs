//! Type-erased view of a registration engine.
//!
//! `FlowEngine<D>` is generic over its domain; the router stores engines of
//! different domains side by side through this trait. Field names arrive as
//! strings from the tool-selection layer and are resolved here.

use async_trait::async_trait;

use super::engine::FlowEngine;
use crate::domain::foundation::UserId;
use crate::domain::registration::{
    FieldName, FieldUpdates, FieldValue, FlowContext, FlowOutcome, FlowResponse, FlowType,
    RawFieldUpdates,
};
use crate::ports::DomainService;

#[async_trait]
pub trait RegistrationFlow: Send + Sync {
    fn flow_type(&self) -> FlowType;

    /// Whether the access gate lets this caller in.
    fn admits(&self, ctx: &FlowContext) -> bool;

    async fn start(&self, ctx: &FlowContext, updates: &RawFieldUpdates) -> FlowResponse;

    async fn resume(&self, ctx: &FlowContext, updates: &RawFieldUpdates) -> FlowResponse;

    async fn answer(&self, ctx: &FlowContext, value: FieldValue) -> FlowResponse;

    async fn confirm(&self, ctx: &FlowContext) -> FlowResponse;

    async fn change(
        &self,
        ctx: &FlowContext,
        field: &str,
        value: Option<FieldValue>,
    ) -> FlowResponse;

    async fn edit(&self, ctx: &FlowContext) -> FlowResponse;

    async fn edit_fields(&self, ctx: &FlowContext, updates: &RawFieldUpdates) -> FlowResponse;

    async fn delete(&self, ctx: &FlowContext) -> FlowResponse;

    async fn cancel(&self, ctx: &FlowContext) -> FlowResponse;

    async fn discard(&self, user_id: &UserId);
}

impl<D: DomainService> FlowEngine<D> {
    fn resolve_updates(&self, ctx: &FlowContext, raw: &RawFieldUpdates) -> FieldUpdates<D::Field> {
        let (updates, unknown) = FieldUpdates::from_raw(raw);
        if !unknown.is_empty() {
            tracing::debug!(
                user_id = %ctx.user_id,
                flow = %self.flow_type(),
                ignored = ?unknown,
                "Ignoring unknown fields"
            );
        }
        updates
    }

    fn invalid_field(&self, field_name: &str) -> FlowResponse {
        let message = self
            .messages()
            .invalid_field_with(field_name, &self.service().valid_fields_formatted());
        FlowResponse::text(
            message,
            FlowOutcome::InvalidField {
                field: field_name.to_string(),
            },
        )
    }
}

#[async_trait]
impl<D: DomainService> RegistrationFlow for FlowEngine<D> {
    fn flow_type(&self) -> FlowType {
        FlowEngine::flow_type(self)
    }

    fn admits(&self, ctx: &FlowContext) -> bool {
        FlowEngine::admits(self, ctx)
    }

    async fn start(&self, ctx: &FlowContext, updates: &RawFieldUpdates) -> FlowResponse {
        let updates = self.resolve_updates(ctx, updates);
        self.start_registration(ctx, updates).await
    }

    async fn resume(&self, ctx: &FlowContext, updates: &RawFieldUpdates) -> FlowResponse {
        let updates = self.resolve_updates(ctx, updates);
        self.continue_registration(ctx, updates).await
    }

    async fn answer(&self, ctx: &FlowContext, value: FieldValue) -> FlowResponse {
        self.answer_awaited_field(ctx, value).await
    }

    async fn confirm(&self, ctx: &FlowContext) -> FlowResponse {
        self.confirm_registration(ctx).await
    }

    async fn change(
        &self,
        ctx: &FlowContext,
        field: &str,
        value: Option<FieldValue>,
    ) -> FlowResponse {
        if !self.service().is_field_valid(field) {
            return self.invalid_field(field);
        }
        match D::Field::parse(field) {
            Some(field) => self.change_registration_field(ctx, field, value).await,
            None => self.invalid_field(field),
        }
    }

    async fn edit(&self, ctx: &FlowContext) -> FlowResponse {
        self.enter_edit_mode(ctx).await
    }

    async fn edit_fields(&self, ctx: &FlowContext, updates: &RawFieldUpdates) -> FlowResponse {
        let updates = self.resolve_updates(ctx, updates);
        self.apply_record_updates(ctx, updates).await
    }

    async fn delete(&self, ctx: &FlowContext) -> FlowResponse {
        self.delete_record(ctx).await
    }

    async fn cancel(&self, ctx: &FlowContext) -> FlowResponse {
        self.cancel_registration(ctx).await
    }

    async fn discard(&self, user_id: &UserId) {
        FlowEngine::discard(self, user_id).await
    }
}
