//! Handle to a started workflow run.

use crate::cancellation::CancellationToken;
use crate::core::{ExecutionState, RunReport, StateCell};
use crate::errors::ExecutorError;
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Returned by [`super::Executor::start`].
///
/// The run keeps going whether or not the handle is kept; dropping it only
/// gives up the ability to await or cancel.
#[derive(Debug)]
pub struct RunHandle {
    run_id: Uuid,
    join: JoinHandle<RunReport>,
    state: Arc<StateCell>,
    cancel_token: Arc<CancellationToken>,
}

impl RunHandle {
    pub(crate) fn new(
        run_id: Uuid,
        join: JoinHandle<RunReport>,
        state: Arc<StateCell>,
        cancel_token: Arc<CancellationToken>,
    ) -> Self {
        Self {
            run_id,
            join,
            state,
            cancel_token,
        }
    }

    /// Returns the run ID.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the current execution state.
    #[must_use]
    pub fn state(&self) -> ExecutionState {
        self.state.get()
    }

    /// Returns true once the run has dispatched its terminal handler.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Requests cancellation.
    ///
    /// The stage in flight resolves to `Failure::Cancelled` and no further
    /// stage starts. Steps are not aborted; they can watch the token through
    /// the workflow context. Has no effect once the run is terminal.
    pub fn cancel(&self, reason: impl Into<String>) {
        self.cancel_token.cancel(reason);
    }

    /// Waits for the run to reach a terminal state.
    pub async fn wait(self) -> Result<RunReport, ExecutorError> {
        self.join
            .await
            .map_err(|e| ExecutorError::Runtime(format!("workflow task failed: {e}")))
    }
}
