//! Drives a started workflow stage by stage.

use super::Stage;
use crate::cancellation::CancellationToken;
use crate::config::ExecutorConfig;
use crate::context::WorkflowContext;
use crate::core::{ExecutionState, RunReport, StateCell};
use crate::errors::{DeadlineScope, Failure, StepError};
use crate::events::EventSink;
use crate::steps::{Step, StepOutcome};
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::json;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, debug_span, info, warn, Instrument};

pub(crate) type SuccessHandler = Box<dyn FnOnce() + Send>;
pub(crate) type FailureHandler<E> = Box<dyn FnOnce(Failure<E>) + Send>;

/// Everything a started run owns.
pub(crate) struct Run<E> {
    pub(crate) workflow: String,
    pub(crate) stages: Vec<Stage<E>>,
    pub(crate) on_success: Option<SuccessHandler>,
    pub(crate) on_failure: Option<FailureHandler<E>>,
    pub(crate) config: ExecutorConfig,
    pub(crate) context: Arc<WorkflowContext>,
    pub(crate) sink: Arc<dyn EventSink>,
    pub(crate) state: Arc<StateCell>,
}

impl<E: StepError> Run<E> {
    /// Runs every stage in order, then dispatches exactly one terminal handler.
    pub(crate) async fn drive(self) -> RunReport {
        let Self {
            workflow,
            stages,
            on_success,
            on_failure,
            config,
            context,
            sink,
            state,
        } = self;

        let started_at = Utc::now();
        let stage_count = stages.len();
        let run_id = context.run_id();

        info!(stages = stage_count, "workflow started");
        sink.emit(
            "workflow.started",
            Some(json!({
                "run_id": run_id.to_string(),
                "workflow": &workflow,
                "stages": stage_count,
            })),
        );

        let runner = StageRunner {
            config: &config,
            context: &context,
            sink: sink.as_ref(),
        };

        let token = Arc::clone(context.cancel_token());
        let cancel_sink = Arc::clone(&sink);
        let cancel_token = Arc::downgrade(&token);
        token.on_cancel(move || {
            let reason = cancel_token
                .upgrade()
                .and_then(|token| token.reason())
                .unwrap_or_default();
            info!(%run_id, %reason, "workflow cancellation requested");
            cancel_sink.emit(
                "workflow.cancel_requested",
                Some(json!({ "run_id": run_id.to_string(), "reason": reason })),
            );
        });

        let mut stages_completed = 0;
        let mut outcome = if token.is_cancelled() {
            Err(cancelled(&token))
        } else {
            Ok(())
        };
        if outcome.is_ok() {
            for (index, stage) in stages.into_iter().enumerate() {
                if let Err(failure) = runner.run_stage(index, stage).await {
                    outcome = Err(failure);
                    break;
                }
                stages_completed += 1;
            }
        }

        let error = match outcome {
            Ok(()) => {
                state.transition(ExecutionState::Succeeded);
                info!(stages = stage_count, "workflow succeeded");
                sink.emit(
                    "workflow.succeeded",
                    Some(json!({
                        "run_id": run_id.to_string(),
                        "workflow": &workflow,
                    })),
                );
                if let Some(handler) = on_success {
                    invoke_handler("success", handler);
                }
                None
            }
            Err(failure) => {
                let message = failure.to_string();
                state.transition(ExecutionState::Failed);
                warn!(
                    error = %message,
                    kind = failure.kind(),
                    stages_completed,
                    "workflow failed"
                );
                sink.emit(
                    "workflow.failed",
                    Some(json!({
                        "run_id": run_id.to_string(),
                        "workflow": &workflow,
                        "kind": failure.kind(),
                        "error": &message,
                        "stages_completed": stages_completed,
                    })),
                );
                match on_failure {
                    Some(handler) => invoke_handler("failure", move || handler(failure)),
                    None => warn!("workflow failed with no failure handler registered"),
                }
                Some(message)
            }
        };

        RunReport {
            run_id,
            workflow,
            state: state.get(),
            stages_completed,
            stage_count,
            started_at,
            ended_at: Utc::now(),
            error,
        }
    }
}

struct StageRunner<'a> {
    config: &'a ExecutorConfig,
    context: &'a Arc<WorkflowContext>,
    sink: &'a dyn EventSink,
}

impl StageRunner<'_> {
    async fn run_stage<E: StepError>(&self, index: usize, stage: Stage<E>) -> Result<(), Failure<E>> {
        let token = Arc::clone(self.context.cancel_token());
        if token.is_cancelled() {
            return Err(cancelled(&token));
        }

        let label = stage.label(index);
        let run_id = self.context.run_id().to_string();
        debug!(stage = %label, kind = %stage.kind(), steps = stage.len(), "stage started");
        self.sink.emit(
            "stage.started",
            Some(json!({
                "run_id": &run_id,
                "stage": index,
                "label": &label,
                "kind": stage.kind(),
                "steps": stage.step_names(),
            })),
        );

        let started = Instant::now();
        let join = self.join(stage);
        let bounded = async {
            match self.config.stage_timeout() {
                Some(limit) => tokio::time::timeout(limit, join).await.unwrap_or_else(|_| {
                    Err(Failure::DeadlineExceeded {
                        scope: DeadlineScope::Stage,
                        name: label.clone(),
                        timeout: limit,
                    })
                }),
                None => join.await,
            }
        };

        let result = tokio::select! {
            biased;
            () = token.cancelled() => Err(cancelled(&token)),
            result = bounded => result,
        };
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(()) => {
                debug!(stage = %label, duration_ms, "stage completed");
                self.sink.emit(
                    "stage.completed",
                    Some(json!({
                        "run_id": &run_id,
                        "stage": index,
                        "label": &label,
                        "duration_ms": duration_ms,
                    })),
                );
            }
            Err(failure) => {
                warn!(stage = %label, duration_ms, error = %failure, "stage failed");
                self.sink.emit(
                    "stage.failed",
                    Some(json!({
                        "run_id": &run_id,
                        "stage": index,
                        "label": &label,
                        "kind": failure.kind(),
                        "error": failure.to_string(),
                        "duration_ms": duration_ms,
                    })),
                );
            }
        }

        result
    }

    /// Launches every step of the stage, then waits for all of them or the
    /// first failure. Steps still in flight after a failure are detached.
    async fn join<E: StepError>(&self, stage: Stage<E>) -> Result<(), Failure<E>> {
        let mut pending: FuturesUnordered<_> = stage
            .into_steps()
            .into_iter()
            .map(|step| self.spawn_step(step))
            .collect();

        while let Some((name, outcome)) = pending.next().await {
            match outcome {
                Ok(value) => {
                    debug!(step = %name, "step succeeded");
                    self.sink.emit(
                        "step.succeeded",
                        Some(json!({
                            "run_id": self.context.run_id().to_string(),
                            "step": &name,
                        })),
                    );
                    if !value.is_null() && self.context.outputs().record(&name, value).is_some() {
                        warn!(step = %name, "step output replaced an earlier output of the same name");
                    }
                }
                Err(failure) => {
                    self.sink.emit(
                        "step.failed",
                        Some(json!({
                            "run_id": self.context.run_id().to_string(),
                            "step": &name,
                            "kind": failure.kind(),
                            "error": failure.to_string(),
                        })),
                    );
                    if !pending.is_empty() {
                        debug!(
                            step = %name,
                            detached = pending.len(),
                            "leaving unsettled sibling steps running"
                        );
                    }
                    return Err(failure);
                }
            }
        }

        Ok(())
    }

    /// Spawns a step onto the runtime under its deadline.
    ///
    /// Dropping the returned future detaches the task rather than aborting it.
    fn spawn_step<E: StepError>(
        &self,
        step: Step<E>,
    ) -> impl Future<Output = (String, StepOutcome<E>)> {
        let name = step.name().to_string();
        let limit = step.timeout().or_else(|| self.config.step_timeout());
        let ctx = Arc::clone(self.context);
        let deadline_name = name.clone();

        let handle = tokio::spawn(
            async move {
                let work = step.launch(ctx);
                match limit {
                    Some(limit) => tokio::time::timeout(limit, work).await.unwrap_or_else(|_| {
                        Err(Failure::DeadlineExceeded {
                            scope: DeadlineScope::Step,
                            name: deadline_name,
                            timeout: limit,
                        })
                    }),
                    None => work.await,
                }
            }
            .instrument(debug_span!("step", step = %name)),
        );

        async move {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    let message = if join_error.is_panic() {
                        panic_message(join_error.into_panic().as_ref())
                    } else {
                        "step task was aborted".to_string()
                    };
                    Err(Failure::Panicked {
                        step: name.clone(),
                        message,
                    })
                }
            };
            (name, outcome)
        }
    }
}

fn cancelled<E>(token: &CancellationToken) -> Failure<E> {
    Failure::Cancelled {
        reason: token.reason().unwrap_or_else(|| "cancelled".to_string()),
    }
}

fn invoke_handler(kind: &'static str, handler: impl FnOnce()) {
    if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(handler)) {
        warn!(
            handler = kind,
            panic = %panic_message(panic.as_ref()),
            "terminal handler panicked"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
