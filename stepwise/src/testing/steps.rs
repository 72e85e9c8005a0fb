//! Canned steps for testing.

use crate::errors::StepError;
use crate::steps::Step;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A step that sleeps for `delay`, then succeeds with `value`.
pub fn succeed_after<E: StepError>(name: impl Into<String>, delay: Duration, value: Value) -> Step<E> {
    Step::new(name, move |_ctx| async move {
        tokio::time::sleep(delay).await;
        Ok(value)
    })
}

/// A step that sleeps for `delay`, then fails with `error`.
pub fn fail_after<E: StepError>(name: impl Into<String>, delay: Duration, error: E) -> Step<E> {
    Step::new(name, move |_ctx| async move {
        tokio::time::sleep(delay).await;
        Err(error)
    })
}

/// A step whose future never resolves.
pub fn never_settles<E: StepError>(name: impl Into<String>) -> Step<E> {
    Step::new(name, |_ctx| std::future::pending::<Result<Value, E>>())
}

/// A step that writes `start:<name>` and `end:<name>` to `log` around a
/// sleep of `delay`, then succeeds with its own name.
pub fn logged_step<E: StepError>(name: impl Into<String>, delay: Duration, log: &StepLog) -> Step<E> {
    let name = name.into();
    let label = name.clone();
    let log = log.clone();
    Step::new(name, move |_ctx| async move {
        log.push(format!("start:{label}"));
        tokio::time::sleep(delay).await;
        log.push(format!("end:{label}"));
        Ok(Value::String(label))
    })
}

/// An append-only log shared between steps and the test body.
#[derive(Debug, Clone, Default)]
pub struct StepLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl StepLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Returns a copy of all entries in append order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Returns the index of the first matching entry.
    #[must_use]
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries.lock().iter().position(|e| e == entry)
    }

    /// Returns true if the entry was logged.
    #[must_use]
    pub fn contains(&self, entry: &str) -> bool {
        self.position(entry).is_some()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing was logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
