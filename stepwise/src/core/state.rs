//! Execution state and stage kind enums.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The shape of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// A stage holding exactly one step.
    Single,
    /// A stage whose steps run concurrently and are joined.
    Parallel,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Parallel => write!(f, "parallel"),
        }
    }
}

/// The lifecycle state of an executor.
///
/// Transitions are one-way: `Idle → Running → {Succeeded | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    /// Built but not started.
    Idle,
    /// Stages are being driven.
    Running,
    /// Every stage succeeded.
    Succeeded,
    /// A stage failed.
    Failed,
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl ExecutionState {
    /// Returns true if the state is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns true if `next` is a legal successor of this state.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Succeeded)
                | (Self::Running, Self::Failed)
        )
    }
}

/// Shared, guarded holder for an [`ExecutionState`].
#[derive(Debug, Default)]
pub(crate) struct StateCell {
    state: RwLock<ExecutionState>,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self) -> ExecutionState {
        *self.state.read()
    }

    /// Moves to `next` if that is a legal transition; returns whether it moved.
    pub(crate) fn transition(&self, next: ExecutionState) -> bool {
        let mut state = self.state.write();
        if state.can_transition_to(next) {
            *state = next;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(ExecutionState::Idle.to_string(), "idle");
        assert_eq!(ExecutionState::Running.to_string(), "running");
        assert_eq!(ExecutionState::Succeeded.to_string(), "succeeded");
        assert_eq!(ExecutionState::Failed.to_string(), "failed");
        assert_eq!(StageKind::Parallel.to_string(), "parallel");
    }

    #[test]
    fn test_state_is_terminal() {
        assert!(!ExecutionState::Idle.is_terminal());
        assert!(!ExecutionState::Running.is_terminal());
        assert!(ExecutionState::Succeeded.is_terminal());
        assert!(ExecutionState::Failed.is_terminal());
    }

    #[test]
    fn test_transitions_are_one_way() {
        use ExecutionState::{Failed, Idle, Running, Succeeded};

        assert!(Idle.can_transition_to(Running));
        assert!(Running.can_transition_to(Succeeded));
        assert!(Running.can_transition_to(Failed));

        assert!(!Idle.can_transition_to(Succeeded));
        assert!(!Running.can_transition_to(Idle));
        assert!(!Succeeded.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Succeeded));
        assert!(!Running.can_transition_to(Running));
    }

    #[test]
    fn test_state_cell_rejects_illegal_moves() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), ExecutionState::Idle);

        assert!(!cell.transition(ExecutionState::Failed));
        assert!(cell.transition(ExecutionState::Running));
        assert!(!cell.transition(ExecutionState::Running));
        assert!(cell.transition(ExecutionState::Failed));
        assert!(!cell.transition(ExecutionState::Succeeded));
        assert_eq!(cell.get(), ExecutionState::Failed);
    }

    #[test]
    fn test_state_serialize() {
        let json = serde_json::to_string(&ExecutionState::Succeeded).unwrap();
        assert_eq!(json, r#""succeeded""#);

        let kind: StageKind = serde_json::from_str(r#""single""#).unwrap();
        assert_eq!(kind, StageKind::Single);
    }
}
