//! State store errors.

use super::error_code::{self, StratusErrorCode};

/// Errors raised by a [`StateStore`](crate::traits::StateStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("State store lock poisoned during {operation}")]
    LockPoisoned { operation: &'static str },

    #[error("State store backend error: {message}")]
    Backend { message: String },

    #[error("Record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StratusErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::LockPoisoned { .. } => error_code::STORAGE_LOCK_POISONED,
            _ => error_code::STORAGE_ERROR,
        }
    }
}
