//! Executor builder.

use super::runner::{FailureHandler, Run, SuccessHandler};
use super::{RunHandle, Stage};
use crate::config::ExecutorConfig;
use crate::context::WorkflowContext;
use crate::core::{ExecutionState, RunReport, StateCell};
use crate::errors::{ExecutorError, Failure, StepError};
use crate::events::{EventSink, NoOpEventSink};
use crate::steps::Step;
use std::sync::Arc;
use tracing::{info_span, Instrument};

/// Builds and starts a staged workflow.
///
/// ```rust,ignore
/// let mut executor = Executor::begin(Some(generate_id))
///     .with_config(ExecutorConfig::new().with_workflow_name("onboarding"));
/// executor
///     .next(put_client)?
///     .fan_out([upload_logo, send_welcome])?
///     .on_success(|| info!("client onboarded"))?
///     .on_failure(|failure| warn!(%failure, "onboarding failed"))?;
/// let handle = executor.start()?;
/// ```
///
/// An executor is single-use: once started, every mutating call returns an
/// [`ExecutorError`].
pub struct Executor<E> {
    stages: Vec<Stage<E>>,
    on_success: Option<SuccessHandler>,
    on_failure: Option<FailureHandler<E>>,
    config: ExecutorConfig,
    context: Arc<WorkflowContext>,
    sink: Arc<dyn EventSink>,
    state: Arc<StateCell>,
}

impl<E: StepError> Executor<E> {
    /// Creates an executor; a supplied step becomes stage 0.
    #[must_use]
    pub fn begin(first: Option<Step<E>>) -> Self {
        Self {
            stages: first.map(Stage::Single).into_iter().collect(),
            on_success: None,
            on_failure: None,
            config: ExecutorConfig::default(),
            context: Arc::new(WorkflowContext::new()),
            sink: Arc::new(NoOpEventSink),
            state: Arc::new(StateCell::new()),
        }
    }

    /// Creates an executor with no stages.
    #[must_use]
    pub fn new() -> Self {
        Self::begin(None)
    }

    /// Sets the configuration. Replaces any name set earlier.
    #[must_use]
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the workflow name used in logs and events.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.config.workflow_name = name.into();
        self
    }

    /// Uses a caller-prepared context instead of a fresh one.
    ///
    /// The context must not have been started by another executor; keep an
    /// `Arc` clone to read results after the run.
    #[must_use]
    pub fn with_context(mut self, context: Arc<WorkflowContext>) -> Self {
        self.context = context;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Appends a single-step stage.
    pub fn next(&mut self, step: Step<E>) -> Result<&mut Self, ExecutorError> {
        self.ensure_idle()?;
        self.stages.push(Stage::Single(step));
        Ok(self)
    }

    /// Appends a parallel stage.
    ///
    /// The steps are collected before this returns. An empty collection
    /// makes a stage that succeeds immediately.
    pub fn fan_out<I>(&mut self, steps: I) -> Result<&mut Self, ExecutorError>
    where
        I: IntoIterator<Item = Step<E>>,
    {
        self.ensure_idle()?;
        self.stages.push(Stage::Parallel(steps.into_iter().collect()));
        Ok(self)
    }

    /// Registers the success handler. The last registration wins.
    pub fn on_success<F>(&mut self, handler: F) -> Result<&mut Self, ExecutorError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.ensure_handlers_open()?;
        self.on_success = Some(Box::new(handler));
        Ok(self)
    }

    /// Registers the failure handler. The last registration wins.
    pub fn on_failure<F>(&mut self, handler: F) -> Result<&mut Self, ExecutorError>
    where
        F: FnOnce(Failure<E>) + Send + 'static,
    {
        self.ensure_handlers_open()?;
        self.on_failure = Some(Box::new(handler));
        Ok(self)
    }

    /// Starts the run on the current tokio runtime and returns immediately.
    ///
    /// # Errors
    ///
    /// - `AlreadyStarted` on a second call
    /// - `InvalidConfig` if the configuration fails validation
    /// - `Runtime` if called outside a tokio runtime
    /// - `ContextInUse` if the context was already started by another executor
    ///
    /// The executor stays idle when an error is returned.
    pub fn start(&mut self) -> Result<RunHandle, ExecutorError> {
        self.ensure_idle()?;
        self.config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ExecutorError::Runtime(e.to_string()))?;

        if !self.context.claim() {
            return Err(ExecutorError::ContextInUse {
                run_id: self.context.run_id(),
            });
        }
        if !self.state.transition(ExecutionState::Running) {
            return Err(ExecutorError::AlreadyStarted);
        }

        let run_id = self.context.run_id();
        let run = Run {
            workflow: self.config.workflow_name.clone(),
            stages: std::mem::take(&mut self.stages),
            on_success: self.on_success.take(),
            on_failure: self.on_failure.take(),
            config: self.config.clone(),
            context: Arc::clone(&self.context),
            sink: Arc::clone(&self.sink),
            state: Arc::clone(&self.state),
        };

        let span = info_span!("workflow", workflow = %self.config.workflow_name, %run_id);
        let join = runtime.spawn(run.drive().instrument(span));

        Ok(RunHandle::new(
            run_id,
            join,
            Arc::clone(&self.state),
            Arc::clone(self.context.cancel_token()),
        ))
    }

    /// Starts the run and waits for it to settle.
    pub async fn run(&mut self) -> Result<RunReport, ExecutorError> {
        self.start()?.wait().await
    }

    /// Returns the current execution state.
    #[must_use]
    pub fn state(&self) -> ExecutionState {
        self.state.get()
    }

    /// Returns the number of stages not yet handed to a run.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns the workflow name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.workflow_name
    }

    /// Returns the context the run reads and writes.
    #[must_use]
    pub fn context(&self) -> &Arc<WorkflowContext> {
        &self.context
    }

    fn ensure_idle(&self) -> Result<(), ExecutorError> {
        if self.state.get() == ExecutionState::Idle {
            Ok(())
        } else {
            Err(ExecutorError::AlreadyStarted)
        }
    }

    fn ensure_handlers_open(&self) -> Result<(), ExecutorError> {
        if self.state.get() == ExecutionState::Idle {
            Ok(())
        } else {
            Err(ExecutorError::HandlerAfterStart)
        }
    }
}

impl<E: StepError> Default for Executor<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Executor<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("name", &self.config.workflow_name)
            .field("stages", &self.stages.len())
            .field("state", &self.state.get())
            .field("run_id", &self.context.run_id())
            .finish_non_exhaustive()
    }
}
