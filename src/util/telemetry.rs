//! Telemetry helpers for structured logging.

/// Install a default env-filtered tracing subscriber if none is set.
/// Callers embedding the engine can install their own instead.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
