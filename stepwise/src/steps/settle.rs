//! Settle-once continuation handle for callback-style steps.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

type Slot<E> = Mutex<Option<oneshot::Sender<Result<serde_json::Value, E>>>>;

/// The `succeed` / `fail` pair handed to a callback-style step.
///
/// Cloneable, so it can be moved into whatever callback eventually learns the
/// outcome. Exactly one settlement is honoured across all clones; later calls
/// return `false` and change nothing. Dropping every clone without settling
/// abandons the step.
pub struct Settle<E> {
    step: Arc<str>,
    slot: Arc<Slot<E>>,
}

impl<E> Settle<E> {
    pub(crate) fn channel(
        step: &str,
    ) -> (Self, oneshot::Receiver<Result<serde_json::Value, E>>) {
        let (sender, receiver) = oneshot::channel();
        let settle = Self {
            step: Arc::from(step),
            slot: Arc::new(Mutex::new(Some(sender))),
        };
        (settle, receiver)
    }

    /// Settles the step successfully. Returns false if it was already settled.
    pub fn succeed(&self, value: serde_json::Value) -> bool {
        self.settle(Ok(value))
    }

    /// Settles the step with an error. Returns false if it was already settled.
    pub fn fail(&self, error: E) -> bool {
        self.settle(Err(error))
    }

    /// Returns true once either continuation has been called.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.slot.lock().is_none()
    }

    /// Returns the name of the step this handle belongs to.
    #[must_use]
    pub fn step(&self) -> &str {
        &self.step
    }

    fn settle(&self, outcome: Result<serde_json::Value, E>) -> bool {
        let Some(sender) = self.slot.lock().take() else {
            debug!(step = %self.step, "ignoring repeated settlement");
            return false;
        };
        // The receiver is gone once the step's deadline fired; the outcome
        // still counts as this handle's single settlement.
        if sender.send(outcome).is_err() {
            debug!(step = %self.step, "step settled after its outcome stopped mattering");
        }
        true
    }
}

impl<E> Clone for Settle<E> {
    fn clone(&self) -> Self {
        Self {
            step: Arc::clone(&self.step),
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<E> std::fmt::Debug for Settle<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settle")
            .field("step", &self.step)
            .field("settled", &self.is_settled())
            .finish()
    }
}
