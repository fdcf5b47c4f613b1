//! Selector and query-language errors.

use super::error_code::{self, StratusErrorCode};

/// Errors raised while parsing or evaluating a `Service|Operation|Query` selector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectorError {
    #[error("Malformed selector `{selector}`: {reason}")]
    Malformed { selector: String, reason: String },

    #[error("Query syntax error at offset {offset} in `{query}`: {message}")]
    Syntax {
        query: String,
        offset: usize,
        message: String,
    },

    #[error("Unknown query function `{name}`")]
    UnknownFunction { name: String },

    #[error("Function `{function}` expected {expected}, got {actual}")]
    InvalidType {
        function: String,
        expected: String,
        actual: String,
    },

    #[error("Function `{function}` takes {expected} argument(s), got {actual}")]
    InvalidArity {
        function: String,
        expected: String,
        actual: usize,
    },
}

impl StratusErrorCode for SelectorError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => error_code::SELECTOR_MALFORMED,
            Self::Syntax { .. } | Self::UnknownFunction { .. } => error_code::QUERY_SYNTAX,
            Self::InvalidType { .. } | Self::InvalidArity { .. } => error_code::QUERY_RUNTIME,
        }
    }
}
