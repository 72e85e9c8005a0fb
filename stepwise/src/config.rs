//! Executor configuration.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a workflow executor.
///
/// Passed to [`crate::executor::Executor::with_config`] at construction time;
/// there is no process-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Name used in logs and events.
    #[serde(default = "default_workflow_name")]
    pub workflow_name: String,
    /// Deadline applied to each step, in milliseconds. `None` disables it.
    #[serde(default = "default_step_timeout_ms")]
    pub step_timeout_ms: Option<u64>,
    /// Deadline applied to each stage as a whole, in milliseconds.
    #[serde(default)]
    pub stage_timeout_ms: Option<u64>,
}

fn default_workflow_name() -> String {
    "workflow".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_step_timeout_ms() -> Option<u64> {
    Some(30_000)
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            workflow_name: default_workflow_name(),
            step_timeout_ms: default_step_timeout_ms(),
            stage_timeout_ms: None,
        }
    }
}

impl ExecutorConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON configuration document.
    ///
    /// Missing fields take their defaults. An explicit `null` step timeout
    /// disables the step deadline.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the workflow name.
    #[must_use]
    pub fn with_workflow_name(mut self, name: impl Into<String>) -> Self {
        self.workflow_name = name.into();
        self
    }

    /// Sets the per-step deadline.
    #[must_use]
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout_ms = Some(duration_to_ms(timeout));
        self
    }

    /// Disables the per-step deadline.
    #[must_use]
    pub fn without_step_timeout(mut self) -> Self {
        self.step_timeout_ms = None;
        self
    }

    /// Sets the per-stage deadline.
    #[must_use]
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout_ms = Some(duration_to_ms(timeout));
        self
    }

    /// Returns the per-step deadline.
    #[must_use]
    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_ms.map(Duration::from_millis)
    }

    /// Returns the per-stage deadline.
    #[must_use]
    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_ms.map(Duration::from_millis)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroTimeout {
                field: "step_timeout_ms",
            });
        }
        if self.stage_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroTimeout {
                field: "stage_timeout_ms",
            });
        }
        Ok(())
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
