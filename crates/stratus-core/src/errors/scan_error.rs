//! Scan pipeline errors. Only identity resolution and broken plans abort a scan.

use super::error_code::{self, StratusErrorCode};
use super::{ConfigError, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Cannot resolve account identity for profile `{profile}`: {message}")]
    IdentityResolution { profile: String, message: String },

    #[error("Scan plan error: {0}")]
    Plan(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl StratusErrorCode for ScanError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::IdentityResolution { .. } => error_code::IDENTITY_RESOLUTION,
            Self::Plan(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
        }
    }
}
