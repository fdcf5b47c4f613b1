//! Tracing bootstrap.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Environment variable holding the filter directive.
pub const LOG_ENV_VAR: &str = "STRATUS_LOG";

/// Install the global fmt subscriber. Filter comes from `STRATUS_LOG`,
/// falling back to the configured level. Returns `false` if a subscriber
/// was already installed.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(config.effective_level()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
