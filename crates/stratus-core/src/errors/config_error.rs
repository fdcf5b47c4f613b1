//! Configuration errors. Always fatal: they describe a broken deployment, not a degraded scan.

use super::error_code::{self, StratusErrorCode};
use super::SelectorError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid service descriptor `{service}`: {reason}")]
    InvalidService { service: String, reason: String },

    #[error("Duplicate service key `{0}`")]
    DuplicateService(String),

    #[error("Invalid parameter spec `{key}` for {service}|{operation}: {reason}")]
    InvalidParameter {
        service: String,
        operation: String,
        key: String,
        reason: String,
    },

    #[error("Operation dependency cycle involving {0}")]
    DependencyCycle(String),

    #[error("Selector error in {context}: {source}")]
    Selector {
        context: String,
        #[source]
        source: SelectorError,
    },
}

impl StratusErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DependencyCycle(_) => error_code::CONFIG_DEPENDENCY_CYCLE,
            Self::Selector { source, .. } => source.error_code(),
            _ => error_code::CONFIG_ERROR,
        }
    }
}
