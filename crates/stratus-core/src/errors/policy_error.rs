//! Policy document decoding errors.

use super::error_code::{self, StratusErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("Policy `{policy}` document is not valid JSON: {source}")]
    InvalidDocument {
        policy: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Policy `{policy}` document is not URL-decodable: {message}")]
    InvalidEncoding { policy: String, message: String },

    #[error("Role record is missing `{field}`")]
    MissingField { field: &'static str },
}

impl StratusErrorCode for PolicyError {
    fn error_code(&self) -> &'static str {
        error_code::POLICY_DECODE
    }
}
