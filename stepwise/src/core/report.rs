//! Summary of a finished workflow run.

use super::ExecutionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a run did, returned by [`crate::executor::RunHandle::wait`].
///
/// The failure itself is moved into the failure handler; the report keeps
/// only its rendered message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// The run ID (shared with the workflow context).
    pub run_id: Uuid,
    /// The workflow name.
    pub workflow: String,
    /// The terminal state.
    pub state: ExecutionState,
    /// Number of stages that settled successfully.
    pub stages_completed: usize,
    /// Number of stages the executor was built with.
    pub stage_count: usize,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run reached its terminal state.
    pub ended_at: DateTime<Utc>,
    /// The failure message, for failed runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    /// Returns true if every stage succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.state == ExecutionState::Succeeded
    }

    /// Returns the run duration in milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_ms(&self) -> f64 {
        (self.ended_at - self.started_at).num_milliseconds() as f64
    }
}
