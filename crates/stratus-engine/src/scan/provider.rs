//! The external scanner contract and provider error classification.

use serde_json::Value;
use stratus_core::config::scan_config::{ScanConfig, DEFAULT_IGNORABLE_CODES, DEFAULT_RETRYABLE_CODES};
use stratus_core::types::scan::ParameterObject;
use stratus_core::FxHashSet;

/// An error reported by a cloud provider API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Where a single operation call runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanContext {
    pub account: String,
    pub region: String,
    pub service: String,
    pub operation: String,
}

/// One API operation: call, paginate, return one value per page.
pub trait OperationScanner: Send + Sync {
    fn service(&self) -> &str;
    fn operation(&self) -> &str;
    fn scan(
        &self,
        ctx: &ScanContext,
        parameters: Option<&ParameterObject>,
    ) -> Result<Vec<Value>, ProviderError>;
}

/// Determines which account a profile's credentials belong to.
pub trait IdentityResolver: Send + Sync {
    fn account_id(&self, profile: &str) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The resource has no such sub-configuration; recorded as absence.
    Ignorable,
    /// Throttling or a transient fault; retried with backoff.
    Retryable,
    /// Logged; the call contributes no records.
    Fatal,
}

#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    ignorable: FxHashSet<String>,
    retryable: FxHashSet<String>,
}

impl ErrorClassifier {
    /// Built-in code lists plus the configured extras.
    pub fn from_config(config: &ScanConfig) -> Self {
        let ignorable = DEFAULT_IGNORABLE_CODES
            .iter()
            .map(|c| c.to_string())
            .chain(config.ignorable_error_codes.iter().cloned())
            .collect();
        let retryable = DEFAULT_RETRYABLE_CODES
            .iter()
            .map(|c| c.to_string())
            .chain(config.retryable_error_codes.iter().cloned())
            .collect();
        Self {
            ignorable,
            retryable,
        }
    }

    pub fn classify(&self, error: &ProviderError) -> ErrorClass {
        if self.ignorable.contains(&error.code) {
            ErrorClass::Ignorable
        } else if self.retryable.contains(&error.code) {
            ErrorClass::Retryable
        } else {
            ErrorClass::Fatal
        }
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::from_config(&ScanConfig::default())
    }
}
