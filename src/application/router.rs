//! Routes chat commands to the registration flow they belong to.
//!
//! At most one registration is active per user. Starting a different flow
//! discards the previous flow's draft; every other command goes to the flow
//! named by the session's `activeRegistration`.

use std::collections::HashMap;
use std::sync::Arc;

use super::flow::RegistrationFlow;
use crate::domain::foundation::UserId;
use crate::domain::registration::{FieldValue, FlowContext, FlowResponse, FlowType, RawFieldUpdates};
use crate::ports::{SessionStore, SessionStoreError};

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("No flow registered for '{0}'")]
    UnknownFlow(FlowType),

    #[error("No registration in progress")]
    NoActiveRegistration,

    #[error(transparent)]
    Session(#[from] SessionStoreError),
}

/// A command from the tool-selection layer.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowCommand {
    Start {
        flow_type: FlowType,
        updates: RawFieldUpdates,
    },
    Continue {
        updates: RawFieldUpdates,
    },
    Answer {
        value: FieldValue,
    },
    Confirm,
    Change {
        field: String,
        value: Option<FieldValue>,
    },
    Edit,
    EditFields {
        updates: RawFieldUpdates,
    },
    Delete,
    Cancel,
}

pub struct FlowRouter {
    flows: HashMap<FlowType, Arc<dyn RegistrationFlow>>,
    sessions: Arc<dyn SessionStore>,
}

impl FlowRouter {
    pub fn builder(sessions: Arc<dyn SessionStore>) -> FlowRouterBuilder {
        FlowRouterBuilder {
            flows: HashMap::new(),
            sessions,
        }
    }

    /// Registered flow types, in declaration order.
    pub fn flow_types(&self) -> Vec<FlowType> {
        FlowType::ALL
            .into_iter()
            .filter(|flow_type| self.flows.contains_key(flow_type))
            .collect()
    }

    pub fn flow(&self, flow_type: FlowType) -> Result<&Arc<dyn RegistrationFlow>, RouterError> {
        self.flows
            .get(&flow_type)
            .ok_or(RouterError::UnknownFlow(flow_type))
    }

    /// Flow type of the user's active registration, if any.
    pub async fn active_flow_type(
        &self,
        user_id: &UserId,
    ) -> Result<Option<FlowType>, RouterError> {
        let Some(state) = self.sessions.get(user_id).await? else {
            return Ok(None);
        };
        let registration = state
            .active_registration()
            .map_err(|e| SessionStoreError::Corrupt(e.to_string()))?;
        Ok(registration.and_then(|registration| registration.flow_type))
    }

    pub async fn handle(
        &self,
        ctx: &FlowContext,
        command: FlowCommand,
    ) -> Result<FlowResponse, RouterError> {
        match command {
            FlowCommand::Start { flow_type, updates } => self.start(ctx, flow_type, &updates).await,
            FlowCommand::Continue { updates } => {
                Ok(self.active(ctx).await?.resume(ctx, &updates).await)
            }
            FlowCommand::Answer { value } => Ok(self.active(ctx).await?.answer(ctx, value).await),
            FlowCommand::Confirm => Ok(self.active(ctx).await?.confirm(ctx).await),
            FlowCommand::Change { field, value } => {
                Ok(self.active(ctx).await?.change(ctx, &field, value).await)
            }
            FlowCommand::Edit => Ok(self.active(ctx).await?.edit(ctx).await),
            FlowCommand::EditFields { updates } => {
                Ok(self.active(ctx).await?.edit_fields(ctx, &updates).await)
            }
            FlowCommand::Delete => Ok(self.active(ctx).await?.delete(ctx).await),
            FlowCommand::Cancel => Ok(self.active(ctx).await?.cancel(ctx).await),
        }
    }

    /// Starts `flow_type`, discarding another flow's draft if it was active.
    pub async fn start(
        &self,
        ctx: &FlowContext,
        flow_type: FlowType,
        updates: &RawFieldUpdates,
    ) -> Result<FlowResponse, RouterError> {
        let flow = self.flow(flow_type)?;
        let user_id = &ctx.user_id;

        if flow.admits(ctx) {
            if let Some(active) = self.active_flow_type(user_id).await? {
                if active != flow_type {
                    tracing::info!(
                        user_id = %user_id,
                        previous = %active,
                        next = %flow_type,
                        "Superseding active registration"
                    );
                    match self.flows.get(&active) {
                        Some(previous) => previous.discard(user_id).await,
                        None => tracing::warn!(
                            user_id = %user_id,
                            flow = %active,
                            "Active registration belongs to an unregistered flow"
                        ),
                    }
                }
            }
        }

        Ok(flow.start(ctx, updates).await)
    }

    async fn active(&self, ctx: &FlowContext) -> Result<&Arc<dyn RegistrationFlow>, RouterError> {
        let flow_type = self
            .active_flow_type(&ctx.user_id)
            .await?
            .ok_or(RouterError::NoActiveRegistration)?;
        self.flow(flow_type)
    }
}

pub struct FlowRouterBuilder {
    flows: HashMap<FlowType, Arc<dyn RegistrationFlow>>,
    sessions: Arc<dyn SessionStore>,
}

impl FlowRouterBuilder {
    /// Registers a flow; a later flow of the same type replaces the earlier one.
    pub fn register(mut self, flow: Arc<dyn RegistrationFlow>) -> Self {
        let flow_type = flow.flow_type();
        if self.flows.insert(flow_type, flow).is_some() {
            tracing::warn!(flow = %flow_type, "Replacing registered flow");
        }
        self
    }

    pub fn build(self) -> FlowRouter {
        FlowRouter {
            flows: self.flows,
            sessions: self.sessions,
        }
    }
}
