//! Cooperative cancellation for workflow runs.
//!
//! Every run owns one [`CancellationToken`]. The executor stops advancing
//! once it is cancelled, and steps can observe it through the workflow context.

mod token;

pub use token::{CancelCallback, CancellationToken};
