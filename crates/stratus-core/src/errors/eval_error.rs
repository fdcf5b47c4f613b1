//! Selector evaluation errors: either the query failed or the store did.

use super::error_code::StratusErrorCode;
use super::{SelectorError, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl StratusErrorCode for EvalError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Selector(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
        }
    }
}
