//! Tracing subscriber setup for binaries and tests that want log output.
//!
//! The library itself only emits through `tracing` macros and an
//! [`EventSink`](crate::events::EventSink); installing a subscriber is left to
//! the caller.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directive used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Installs a global fmt subscriber filtered by `RUST_LOG`.
///
/// With `json` set, each line is a JSON object carrying the current span
/// fields (`workflow`, `run_id`, `step`).
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(json: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = env_filter();
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()?;
    }
    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}
