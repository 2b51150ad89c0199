//! Optional per-domain callbacks injected into the engine.

use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;

use crate::domain::foundation::{RecordId, UserId};
use crate::domain::registration::ServiceError;
use crate::ports::DomainService;

/// Receives the draft and returns the (possibly adjusted) draft to persist.
pub type DraftHook<T> =
    Arc<dyn Fn(UserId, T) -> BoxFuture<'static, Result<T, ServiceError>> + Send + Sync>;

/// Runs after a record was created; cannot affect the outcome.
pub type CompletionHook = Arc<dyn Fn(UserId, RecordId) -> BoxFuture<'static, ()> + Send + Sync>;

pub struct FlowHooks<D: DomainService> {
    /// Runs on the empty draft of a brand new registration, before any value is merged.
    pub on_first_start: Option<DraftHook<D::Draft>>,
    /// Runs right before the record is created.
    pub before_confirmation: Option<DraftHook<D::Draft>>,
    pub after_completion: Option<CompletionHook>,
}

impl<D: DomainService> Default for FlowHooks<D> {
    fn default() -> Self {
        Self {
            on_first_start: None,
            before_confirmation: None,
            after_completion: None,
        }
    }
}

impl<D: DomainService> Clone for FlowHooks<D> {
    fn clone(&self) -> Self {
        Self {
            on_first_start: self.on_first_start.clone(),
            before_confirmation: self.before_confirmation.clone(),
            after_completion: self.after_completion.clone(),
        }
    }
}

impl<D: DomainService> FlowHooks<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_first_start<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(UserId, D::Draft) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<D::Draft, ServiceError>> + Send + 'static,
    {
        let hook: DraftHook<D::Draft> =
            Arc::new(move |user_id, draft| hook(user_id, draft).boxed());
        self.on_first_start = Some(hook);
        self
    }

    pub fn before_confirmation<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(UserId, D::Draft) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<D::Draft, ServiceError>> + Send + 'static,
    {
        let hook: DraftHook<D::Draft> =
            Arc::new(move |user_id, draft| hook(user_id, draft).boxed());
        self.before_confirmation = Some(hook);
        self
    }

    pub fn after_completion<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(UserId, RecordId) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let hook: CompletionHook =
            Arc::new(move |user_id, record_id| hook(user_id, record_id).boxed());
        self.after_completion = Some(hook);
        self
    }
}

/// Applies an optional draft hook; returns `None` when no hook is set.
pub(super) async fn run_draft_hook<T>(
    hook: &Option<DraftHook<T>>,
    user_id: &UserId,
    draft: T,
) -> Result<Option<T>, ServiceError> {
    match hook {
        Some(hook) => hook(user_id.clone(), draft).await.map(Some),
        None => Ok(None),
    }
}
