//! Request and storage logging for the issue server
//!
//! Every event carries structured fields (`project`, `issue_id`, `error`) so a
//! single issue can be followed through the log with a plain grep.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the stderr subscriber, filtered by `RUST_LOG` (default `info`)
///
/// What each level shows:
/// - `error`: list or create failed in storage (the client gets a 500)
/// - `warn`: update or delete failed in storage, in-memory backend selected
/// - `info`: database opened, config loaded/saved, listen address, and one
///   line per request outcome (listed, created, updated, deleted, rejected,
///   unknown or malformed id)
/// - `debug`: ignored filter and update fields, unmatchable filters, match
///   counts for each SQLite query
///
/// `RUST_LOG=issue_tracker=debug,tower=warn` is a useful setting when a filter
/// or update does not do what a client expects.
///
/// # Errors
/// Returns an error if the subscriber has already been initialized
pub fn init() -> crate::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .compact(),
        )
        .try_init()
        .map_err(|e| crate::TrackerError::Other(format!("Failed to initialize tracing: {}", e)))?;

    Ok(())
}

/// Initialize logging for tests (no-op if already initialized)
pub fn init_test() {
    let _ = init();
}
