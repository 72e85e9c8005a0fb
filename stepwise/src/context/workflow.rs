//! The per-run workflow context.

use super::{DataBag, OutputBag};
use crate::cancellation::CancellationToken;
use crate::collaborators::UserContext;
use crate::errors::{ContextError, DataConflictError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Shared state threaded through every step of one workflow run.
///
/// Values produced by an early stage are written here and read by later
/// stages. All access is internally synchronized, so sibling steps of a
/// parallel stage may use it concurrently.
///
/// A context belongs to exactly one run. Starting a second executor with a
/// context that has already been started fails with
/// [`ExecutorError::ContextInUse`](crate::errors::ExecutorError::ContextInUse).
#[derive(Debug)]
pub struct WorkflowContext {
    run_id: Uuid,
    data: DataBag,
    outputs: OutputBag,
    user: Option<UserContext>,
    cancel_token: Arc<CancellationToken>,
    claimed: AtomicBool,
}

impl Default for WorkflowContext {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowContext {
    /// Creates an empty context with a fresh run ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            data: DataBag::new(),
            outputs: OutputBag::new(),
            user: None,
            cancel_token: Arc::new(CancellationToken::new()),
            claimed: AtomicBool::new(false),
        }
    }

    /// Sets the run ID.
    #[must_use]
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    /// Attaches the caller's user context.
    #[must_use]
    pub fn with_user(mut self, user: UserContext) -> Self {
        self.user = Some(user);
        self
    }

    /// Seeds the data bag.
    #[must_use]
    pub fn with_data(mut self, data: HashMap<String, serde_json::Value>) -> Self {
        self.data = DataBag::from_data(data);
        self
    }

    /// Marks the context as owned by a run. Returns false if a run already owns it.
    pub(crate) fn claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Returns true once a run has been started with this context.
    #[must_use]
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }

    /// Returns the run ID.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the user context, if one was attached.
    #[must_use]
    pub fn user(&self) -> Option<&UserContext> {
        self.user.as_ref()
    }

    /// Returns the data bag.
    #[must_use]
    pub fn data(&self) -> &DataBag {
        &self.data
    }

    /// Returns the per-step output bag.
    #[must_use]
    pub fn outputs(&self) -> &OutputBag {
        &self.outputs
    }

    /// Returns the run's cancellation token.
    #[must_use]
    pub fn cancel_token(&self) -> &Arc<CancellationToken> {
        &self.cancel_token
    }

    /// Returns whether the run has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Writes a raw value.
    ///
    /// # Errors
    ///
    /// Returns `DataConflictError` if the key was already written.
    pub fn set(
        &self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<(), DataConflictError> {
        self.data.set(key, value)
    }

    /// Serializes and writes a typed value.
    pub fn set_value<T: Serialize + ?Sized>(
        &self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<(), ContextError> {
        let key = key.into();
        let value = serde_json::to_value(value).map_err(|source| ContextError::Encode {
            key: key.clone(),
            source,
        })?;
        self.data.set(key, value)?;
        Ok(())
    }

    /// Writes a raw value, replacing any existing one.
    pub fn set_force(
        &self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.data.set_force(key, value)
    }

    /// Reads a raw value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.data.get(key)
    }

    /// Reads and deserializes a typed value.
    ///
    /// Returns `Ok(None)` when the key is absent.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ContextError> {
        self.data
            .get(key)
            .map(|value| decode(key, value))
            .transpose()
    }

    /// Checks if a key was written.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Reads the success value a step returned.
    #[must_use]
    pub fn output(&self, step: &str) -> Option<serde_json::Value> {
        self.outputs.get(step)
    }

    /// Reads and deserializes the success value a step returned.
    pub fn output_as<T: DeserializeOwned>(&self, step: &str) -> Result<Option<T>, ContextError> {
        self.outputs
            .get(step)
            .map(|value| decode(step, value))
            .transpose()
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: serde_json::Value) -> Result<T, ContextError> {
    serde_json::from_value(value).map_err(|source| ContextError::Decode {
        key: key.to_string(),
        source,
    })
}
