//! Event sinks for workflow observability.
//!
//! The executor emits lifecycle events (`workflow.started`, `stage.started`,
//! `step.succeeded`, `step.failed`, `stage.completed`, `stage.failed`,
//! `workflow.succeeded`, `workflow.failed`) to the sink it was built with.
//! There is no global sink; pass one to
//! [`crate::executor::Executor::with_event_sink`].

mod sink;

pub use sink::{CollectedEvent, CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
