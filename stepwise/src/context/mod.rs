//! Context management for workflow runs.
//!
//! This module provides:
//! - The per-run `WorkflowContext` handed to every step
//! - Thread-safe bags for shared data and per-step outputs

mod bags;
mod workflow;

pub use bags::{DataBag, OutputBag};
pub use workflow::WorkflowContext;
