//! Stage definitions.

use crate::core::StageKind;
use crate::steps::Step;

/// One unit of executor progress.
#[derive(Debug)]
pub enum Stage<E> {
    /// A single step.
    Single(Step<E>),
    /// Steps that run concurrently; the stage settles once all succeed or
    /// any one fails.
    Parallel(Vec<Step<E>>),
}

impl<E> Stage<E> {
    /// Returns the stage kind.
    #[must_use]
    pub fn kind(&self) -> StageKind {
        match self {
            Self::Single(_) => StageKind::Single,
            Self::Parallel(_) => StageKind::Parallel,
        }
    }

    /// Returns the number of steps in the stage.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Parallel(steps) => steps.len(),
        }
    }

    /// Returns true for a parallel stage with no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the names of the stage's steps.
    #[must_use]
    pub fn step_names(&self) -> Vec<String> {
        match self {
            Self::Single(step) => vec![step.name().to_string()],
            Self::Parallel(steps) => steps.iter().map(|s| s.name().to_string()).collect(),
        }
    }

    /// Label used in logs, events and stage deadline failures.
    pub(crate) fn label(&self, index: usize) -> String {
        match self {
            Self::Single(step) => format!("stage[{index}]:{}", step.name()),
            Self::Parallel(steps) => format!("stage[{index}]:parallel({})", steps.len()),
        }
    }

    pub(crate) fn into_steps(self) -> Vec<Step<E>> {
        match self {
            Self::Single(step) => vec![step],
            Self::Parallel(steps) => steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(name: &str) -> Step<String> {
        Step::new(name, |_ctx| async { Ok(json!(null)) })
    }

    #[test]
    fn test_single_stage() {
        let stage = Stage::Single(step("a"));
        assert_eq!(stage.kind(), StageKind::Single);
        assert_eq!(stage.len(), 1);
        assert_eq!(stage.step_names(), vec!["a".to_string()]);
        assert_eq!(stage.label(0), "stage[0]:a");
    }

    #[test]
    fn test_parallel_stage() {
        let stage = Stage::Parallel(vec![step("b"), step("c")]);
        assert_eq!(stage.kind(), StageKind::Parallel);
        assert_eq!(stage.len(), 2);
        assert_eq!(stage.label(3), "stage[3]:parallel(2)");
        assert_eq!(stage.into_steps().len(), 2);
    }

    #[test]
    fn test_empty_parallel_stage() {
        let stage: Stage<String> = Stage::Parallel(Vec::new());
        assert!(stage.is_empty());
        assert!(stage.step_names().is_empty());
    }
}
