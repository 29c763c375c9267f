//! Diagnostic logging setup.
//!
//! The human-readable report goes to stdout; tracing output goes to stderr
//! and is filtered through `RUST_LOG` (default `warn`).

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Safe to call more than once.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
