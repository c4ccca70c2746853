//! Tracing subscriber bootstrap

use adpulse_domain::{AdPulseError, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Filter directives: `RUST_LOG` wins, then the configured level, then `info`.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// # Errors
/// Returns `AdPulseError::Internal` when a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), AdPulseError> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(config)).with_target(true);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| AdPulseError::Internal(format!("failed to initialise logging: {e}")))
}
