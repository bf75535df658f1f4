use tracing_subscriber::{fmt, EnvFilter};

/// Initializes structured logging for embedding binaries and tests.
///
/// The filter comes from `RUST_LOG` when set, otherwise from the supplied
/// default (typically `AppConfig::log_level`). Safe to call more than once;
/// later calls are ignored.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
