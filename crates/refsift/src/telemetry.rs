//! Tracing setup for embedding binaries.

use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber with `RUST_LOG`-style filtering and routes
/// `log` macro output through tracing. Safe to call more than once; later
/// calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_log::LogTracer::init();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
