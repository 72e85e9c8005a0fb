//! Terminal handler probe.

use crate::errors::{ExecutorError, Failure, StepError};
use crate::executor::Executor;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug)]
struct Calls<E> {
    successes: usize,
    failures: Vec<Failure<E>>,
}

/// Records every call the executor makes to its terminal handlers.
///
/// ```rust,ignore
/// let probe = HandlerProbe::new();
/// probe.attach(&mut executor)?;
/// executor.run().await?;
/// probe.assert_succeeded_once();
/// ```
#[derive(Debug)]
pub struct HandlerProbe<E> {
    calls: Arc<Mutex<Calls<E>>>,
}

impl<E: StepError> HandlerProbe<E> {
    /// Creates a probe with no recorded calls.
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Calls {
                successes: 0,
                failures: Vec::new(),
            })),
        }
    }

    /// Returns a success handler that records into this probe.
    pub fn success_handler(&self) -> impl FnOnce() + Send + 'static {
        let calls = Arc::clone(&self.calls);
        move || calls.lock().successes += 1
    }

    /// Returns a failure handler that records into this probe.
    pub fn failure_handler(&self) -> impl FnOnce(Failure<E>) + Send + 'static {
        let calls = Arc::clone(&self.calls);
        move |failure| calls.lock().failures.push(failure)
    }

    /// Registers both handlers on `executor`.
    ///
    /// # Errors
    ///
    /// Returns `HandlerAfterStart` if the executor already started.
    pub fn attach(&self, executor: &mut Executor<E>) -> Result<(), ExecutorError> {
        executor
            .on_success(self.success_handler())?
            .on_failure(self.failure_handler())?;
        Ok(())
    }

    /// Returns the number of success handler calls.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.calls.lock().successes
    }

    /// Returns the number of failure handler calls.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.calls.lock().failures.len()
    }

    /// Returns the number of terminal handler calls of either kind.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        let calls = self.calls.lock();
        calls.successes + calls.failures.len()
    }

    /// Removes and returns the recorded failures.
    pub fn take_failures(&self) -> Vec<Failure<E>> {
        std::mem::take(&mut self.calls.lock().failures)
    }

    /// Asserts the success handler ran exactly once and the failure handler never did.
    pub fn assert_succeeded_once(&self) {
        let calls = self.calls.lock();
        assert_eq!(
            (calls.successes, calls.failures.len()),
            (1, 0),
            "Expected one success and no failures, got failures: {:?}",
            calls.failures
        );
    }

    /// Asserts the failure handler ran exactly once and the success handler
    /// never did, and returns the failure.
    pub fn assert_failed_once(&self) -> Failure<E> {
        let mut calls = self.calls.lock();
        assert_eq!(
            (calls.successes, calls.failures.len()),
            (0, 1),
            "Expected one failure and no successes, got {} successes and failures: {:?}",
            calls.successes,
            calls.failures
        );
        calls.failures.remove(0)
    }
}

impl<E: StepError> Default for HandlerProbe<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for HandlerProbe<E> {
    fn clone(&self) -> Self {
        Self {
            calls: Arc::clone(&self.calls),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls() {
        let probe: HandlerProbe<String> = HandlerProbe::new();
        (probe.success_handler())();
        assert_eq!(probe.total_calls(), 1);
        probe.assert_succeeded_once();

        let probe: HandlerProbe<String> = HandlerProbe::new();
        (probe.failure_handler())(Failure::Abandoned {
            step: "s".to_string(),
        });
        let failure = probe.assert_failed_once();
        assert_eq!(failure.step_name(), Some("s"));
        assert_eq!(probe.failure_count(), 0);
    }

    #[test]
    #[should_panic(expected = "Expected one success")]
    fn test_assert_succeeded_once_panics_on_failure() {
        let probe: HandlerProbe<String> = HandlerProbe::new();
        (probe.failure_handler())(Failure::Cancelled {
            reason: "stop".to_string(),
        });
        probe.assert_succeeded_once();
    }
}
