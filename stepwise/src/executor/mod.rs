//! The workflow executor.
//!
//! This module provides:
//! - `Stage`: one step, or a parallel group of steps joined before advancing
//! - `Executor`: the builder that accumulates stages and terminal handlers
//! - `RunHandle`: the handle returned by `start()` for awaiting or cancelling
//!
//! Stages run strictly in order. The first failure anywhere stops the run and
//! is handed to the failure handler; nothing that already happened is undone.

mod builder;
mod handle;
mod runner;
mod stage;

pub use builder::Executor;
pub use handle::RunHandle;
pub use stage::Stage;
