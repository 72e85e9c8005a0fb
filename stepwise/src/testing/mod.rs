//! Testing utilities for workflows.
//!
//! This module provides:
//! - Canned steps that succeed, fail, or never settle after a delay
//! - `StepLog` for asserting on start and finish order across steps
//! - `HandlerProbe` for counting terminal handler invocations

mod probe;
mod steps;

pub use probe::HandlerProbe;
pub use steps::{fail_after, logged_step, never_settles, succeed_after, StepLog};
