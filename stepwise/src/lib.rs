//! # Stepwise
//!
//! A staged asynchronous workflow executor.
//!
//! A workflow is an ordered list of stages. Each stage is either a single
//! step or a parallel group of steps that must all succeed before the next
//! stage starts. The first failure anywhere stops the run and is handed to
//! the failure handler; if every stage succeeds the success handler runs.
//! Exactly one of the two is called, at most once.
//!
//! Stepwise provides:
//!
//! - **Fail-fast stages**: sequential stages with fan-out and join
//! - **Shared context**: a per-run `WorkflowContext` with conflict-checked data
//! - **Deadlines and cancellation**: per-step and per-stage timeouts plus a run token
//! - **Event-driven observability**: lifecycle events through an `EventSink`
//! - **Collaborator interfaces**: record, object and email backends for steps to wrap
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepwise::prelude::*;
//!
//! let mut executor = Executor::begin(Some(Step::new("fetch", |_ctx| async {
//!     Ok::<_, anyhow::Error>(json!({ "id": "c-1" }))
//! })));
//! executor
//!     .fan_out([upload_logo, send_welcome])?
//!     .on_success(|| info!("done"))?
//!     .on_failure(|failure| warn!(%failure, "workflow failed"))?;
//!
//! let report = executor.run().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod collaborators;
pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod executor;
pub mod observability;
pub mod steps;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::collaborators::{
        CollaboratorError, EmailDispatcher, KeyExpression, ObjectStore, Record, RecordKey,
        RecordStore, UserContext,
    };
    pub use crate::config::ExecutorConfig;
    pub use crate::context::WorkflowContext;
    pub use crate::core::{ExecutionState, RunReport, StageKind};
    pub use crate::errors::{
        ContextError, DataConflictError, DeadlineScope, ExecutorError, Failure, StepError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::executor::{Executor, RunHandle, Stage};
    pub use crate::steps::{Settle, Step};
}
