//! Steps: the units of asynchronous work a workflow is made of.
//!
//! A step runs once and settles exactly once, with a JSON success value or
//! with the caller's error. Two construction forms are provided:
//!
//! ```rust,ignore
//! // Future form
//! let fetch = Step::new("fetch_client", |ctx| async move {
//!     let id: String = ctx.get_as("client_id")?.unwrap_or_default();
//!     Ok(json!({ "id": id }))
//! });
//!
//! // Continuation form
//! let notify = Step::from_callback("notify", |_ctx, settle| {
//!     tokio::spawn(async move {
//!         settle.succeed(json!("sent"));
//!     });
//! });
//! ```

mod settle;

pub use settle::Settle;

use crate::context::WorkflowContext;
use crate::errors::{Failure, StepError};
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// What a step resolves to once the executor has attributed any error to it.
pub(crate) type StepOutcome<E> = Result<serde_json::Value, Failure<E>>;

type StepFn<E> = Box<dyn FnOnce(Arc<WorkflowContext>) -> BoxFuture<'static, StepOutcome<E>> + Send>;

/// A named unit of asynchronous work.
///
/// A non-null success value is recorded in the context's output bag under the
/// step's name.
pub struct Step<E> {
    name: String,
    timeout: Option<Duration>,
    func: StepFn<E>,
}

impl<E: StepError> Step<E> {
    /// Creates a step from an async closure.
    pub fn new<F, Fut>(name: impl Into<String>, func: F) -> Self
    where
        F: FnOnce(Arc<WorkflowContext>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<serde_json::Value, E>> + Send + 'static,
    {
        let name = name.into();
        let step = name.clone();

        Self {
            name,
            timeout: None,
            func: Box::new(move |ctx| {
                let fut = func(ctx);
                async move { fut.await.map_err(|error| Failure::Step { step, error }) }.boxed()
            }),
        }
    }

    /// Creates a step from a closure that settles through a [`Settle`] handle.
    ///
    /// The closure itself runs synchronously when the step starts; it is
    /// expected to hand the handle to whatever completes the work.
    pub fn from_callback<F>(name: impl Into<String>, func: F) -> Self
    where
        F: FnOnce(Arc<WorkflowContext>, Settle<E>) + Send + 'static,
    {
        let name = name.into();
        let step = name.clone();

        Self {
            name,
            timeout: None,
            func: Box::new(move |ctx| {
                let (settle, receiver) = Settle::channel(&step);
                func(ctx, settle);
                async move {
                    match receiver.await {
                        Ok(Ok(value)) => Ok(value),
                        Ok(Err(error)) => Err(Failure::Step { step, error }),
                        Err(_) => Err(Failure::Abandoned { step }),
                    }
                }
                .boxed()
            }),
        }
    }
}

impl<E> Step<E> {
    /// Overrides the executor's step deadline for this step.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the step name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the step's own deadline, if it overrides the executor's.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Starts the step's work against `ctx`.
    pub(crate) fn launch(self, ctx: Arc<WorkflowContext>) -> BoxFuture<'static, StepOutcome<E>> {
        (self.func)(ctx)
    }
}

impl<E> std::fmt::Debug for Step<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_future_step_success() {
        let step: Step<String> = Step::new("answer", |_ctx| async { Ok(json!(42)) });
        assert_eq!(step.name(), "answer");

        let outcome = step.launch(Arc::new(WorkflowContext::new())).await;
        assert_eq!(outcome.unwrap(), json!(42));
    }

    #[tokio::test]
    async fn test_future_step_error_is_attributed() {
        let step: Step<&str> = Step::new("put_client", |_ctx| async { Err("conflict") });

        let failure = step
            .launch(Arc::new(WorkflowContext::new()))
            .await
            .unwrap_err();
        assert!(
            matches!(failure, Failure::Step { ref step, error } if step == "put_client" && error == "conflict")
        );
    }

    #[tokio::test]
    async fn test_future_step_reads_context() {
        let ctx = Arc::new(WorkflowContext::new());
        ctx.set("client_id", json!("c-9")).unwrap();

        let step: Step<String> = Step::new("echo", |ctx| async move {
            ctx.get("client_id").ok_or_else(|| "missing".to_string())
        });

        assert_eq!(step.launch(ctx).await.unwrap(), json!("c-9"));
    }

    #[tokio::test]
    async fn test_callback_step_settles_later() {
        let step: Step<String> = Step::from_callback("deferred", |_ctx, settle| {
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                settle.succeed(json!("done"));
            });
        });

        let outcome = step.launch(Arc::new(WorkflowContext::new())).await;
        assert_eq!(outcome.unwrap(), json!("done"));
    }

    #[tokio::test]
    async fn test_callback_step_ignores_second_settlement() {
        let step: Step<&str> = Step::from_callback("twice", |_ctx, settle| {
            assert!(settle.fail("first"));
            assert!(!settle.succeed(json!("second")));
        });

        let failure = step
            .launch(Arc::new(WorkflowContext::new()))
            .await
            .unwrap_err();
        assert_eq!(failure.into_step_error(), Some("first"));
    }

    #[tokio::test]
    async fn test_callback_step_abandoned() {
        let step: Step<&str> = Step::from_callback("dropped", |_ctx, settle| drop(settle));

        let failure = step
            .launch(Arc::new(WorkflowContext::new()))
            .await
            .unwrap_err();
        assert!(matches!(failure, Failure::Abandoned { ref step } if step == "dropped"));
    }

    #[test]
    fn test_with_timeout() {
        let step: Step<String> = Step::new("slow", |_ctx| async { Ok(json!(null)) })
            .with_timeout(Duration::from_millis(5));
        assert_eq!(step.timeout(), Some(Duration::from_millis(5)));
        assert!(format!("{step:?}").contains("slow"));
    }
}
