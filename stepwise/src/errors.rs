//! Error types for the stepwise executor.
//!
//! Three families live here:
//!
//! - [`Failure`]: the outcome handed to a workflow's failure handler. Step
//!   errors are carried verbatim; the other variants originate in the executor
//!   itself (deadlines, cancellation, panics, abandoned continuations).
//! - [`ExecutorError`]: misuse of the builder surface (double start, late
//!   handler registration, invalid configuration).
//! - [`ContextError`] / [`DataConflictError`]: workflow context access.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Bound shared by every error type a step may fail with.
///
/// Blanket-implemented, so `String`, `&'static str`, `anyhow::Error` and any
/// `thiserror` enum qualify without extra work.
pub trait StepError: fmt::Debug + fmt::Display + Send + 'static {}

impl<T> StepError for T where T: fmt::Debug + fmt::Display + Send + 'static {}

/// Errors raised by the executor's builder surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// `start()` (or a stage append) was called on an executor that already ran.
    #[error("executor has already been started")]
    AlreadyStarted,

    /// A terminal handler was registered after `start()`.
    #[error("terminal handlers cannot be registered after start")]
    HandlerAfterStart,

    /// The workflow context was already started by another run.
    #[error("workflow context {run_id} already belongs to a run")]
    ContextInUse {
        /// The run ID carried by the context.
        run_id: uuid::Uuid,
    },

    /// The executor configuration failed validation.
    #[error("invalid executor configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// No tokio runtime was available, or the run task was lost.
    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Errors raised while loading or validating an [`crate::config::ExecutorConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A timeout was configured as zero.
    #[error("'{field}' must be greater than zero")]
    ZeroTimeout {
        /// The offending field.
        field: &'static str,
    },

    /// The configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Which deadline elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineScope {
    /// A single step ran past its deadline.
    Step,
    /// A whole stage ran past its deadline.
    Stage,
}

impl fmt::Display for DeadlineScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step => write!(f, "step"),
            Self::Stage => write!(f, "stage"),
        }
    }
}

/// The reason a workflow run failed.
///
/// Only the first failure of a run is ever reported; later failures from
/// sibling steps of the same parallel stage are discarded.
#[derive(Debug)]
pub enum Failure<E> {
    /// A step rejected with the caller's own error.
    Step {
        /// Name of the rejecting step.
        step: String,
        /// The error exactly as the step produced it.
        error: E,
    },

    /// A step or stage did not settle before its deadline.
    DeadlineExceeded {
        /// Whether the step or the stage deadline fired.
        scope: DeadlineScope,
        /// Name of the step, or the label of the stage.
        name: String,
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// The run was cancelled through its [`crate::executor::RunHandle`].
    Cancelled {
        /// The first cancellation reason.
        reason: String,
    },

    /// A step panicked.
    Panicked {
        /// Name of the panicking step.
        step: String,
        /// The panic payload, when it was a string.
        message: String,
    },

    /// Every settle handle of a continuation-style step was dropped unsettled.
    Abandoned {
        /// Name of the abandoned step.
        step: String,
    },
}

impl<E> Failure<E> {
    /// Returns the caller error if this failure came from a step rejection.
    #[must_use]
    pub fn step_error(&self) -> Option<&E> {
        match self {
            Self::Step { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Consumes the failure, returning the caller error if there is one.
    #[must_use]
    pub fn into_step_error(self) -> Option<E> {
        match self {
            Self::Step { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Returns the name of the step involved, if the failure is step-scoped.
    #[must_use]
    pub fn step_name(&self) -> Option<&str> {
        match self {
            Self::Step { step, .. } | Self::Panicked { step, .. } | Self::Abandoned { step } => {
                Some(step)
            }
            Self::DeadlineExceeded {
                scope: DeadlineScope::Step,
                name,
                ..
            } => Some(name),
            Self::DeadlineExceeded { .. } | Self::Cancelled { .. } => None,
        }
    }

    /// Returns true if a deadline elapsed.
    #[must_use]
    pub fn is_deadline(&self) -> bool {
        matches!(self, Self::DeadlineExceeded { .. })
    }

    /// Returns true if the run was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Short machine-readable kind, used in events.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Step { .. } => "step",
            Self::DeadlineExceeded { .. } => "deadline_exceeded",
            Self::Cancelled { .. } => "cancelled",
            Self::Panicked { .. } => "panicked",
            Self::Abandoned { .. } => "abandoned",
        }
    }
}

impl<E: fmt::Display> fmt::Display for Failure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step { step, error } => write!(f, "step '{step}' failed: {error}"),
            Self::DeadlineExceeded {
                scope,
                name,
                timeout,
            } => write!(
                f,
                "deadline exceeded: {scope} '{name}' did not settle within {}ms",
                timeout.as_millis()
            ),
            Self::Cancelled { reason } => write!(f, "workflow cancelled: {reason}"),
            Self::Panicked { step, message } => write!(f, "step '{step}' panicked: {message}"),
            Self::Abandoned { step } => {
                write!(f, "step '{step}' dropped its continuation without settling")
            }
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for Failure<E> {}

/// Error raised when writing to an existing key in the workflow data bag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Data conflict: key '{key}' already exists")]
pub struct DataConflictError {
    /// The conflicting key.
    pub key: String,
}

impl DataConflictError {
    /// Creates a new data conflict error.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Errors raised by typed workflow context access.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The key was already written.
    #[error(transparent)]
    Conflict(#[from] DataConflictError),

    /// A stored value did not match the requested type.
    #[error("value for '{key}' could not be decoded: {source}")]
    Decode {
        /// The key being read.
        key: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be converted to JSON.
    #[error("value for '{key}' could not be encoded: {source}")]
    Encode {
        /// The key being written.
        key: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}
