//! Core domain model types for stepwise.
//!
//! This module contains:
//! - The executor lifecycle state and stage kind enums
//! - The run report returned when a run settles

mod report;
mod state;

pub use report::RunReport;
pub(crate) use state::StateCell;
pub use state::{ExecutionState, StageKind};
