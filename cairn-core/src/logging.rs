//! Structured logging bootstrap.
//!
//! Every component logs through `tracing` with structured fields
//! (`project`, `memory_id`, `query_type`, `stage`) instead of free-text, so a
//! single request can be traced end-to-end across embed/LLM/DB/graph/rerank
//! suspension points.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Honors `RUST_LOG` (default: `info`); emits JSON when `CAIRN_LOG_FORMAT=json`
/// is set, human-readable otherwise.
///
/// # Errors
/// Returns an error if a global subscriber has already been installed.
pub fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var("CAIRN_LOG_FORMAT").as_deref() == Ok("json");

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(true).with_span_list(true))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init()?;
    }
    Ok(())
}
