//! Exponential backoff for retryable provider errors.

use std::time::Duration;

use stratus_core::config::RetryConfig;

use super::provider::{ErrorClass, ErrorClassifier, ProviderError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.effective_max_attempts(),
            base_delay: Duration::from_millis(config.effective_base_delay_ms()),
            max_delay: Duration::from_millis(config.effective_max_delay_ms()),
        }
    }

    /// Delay before retry number `retry` (0-based): `base * 2^retry`, capped.
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Result of a call after retries.
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: Result<T, (ErrorClass, ProviderError)>,
    pub retries: u32,
}

/// Run `call`, retrying retryable errors until `max_attempts` is reached.
/// Exhausted retries are reported as `Fatal`.
pub fn with_retry<T>(
    policy: &RetryPolicy,
    classifier: &ErrorClassifier,
    mut call: impl FnMut() -> Result<T, ProviderError>,
) -> Attempted<T> {
    let mut retries = 0;
    loop {
        match call() {
            Ok(value) => {
                return Attempted {
                    result: Ok(value),
                    retries,
                }
            }
            Err(error) => match classifier.classify(&error) {
                ErrorClass::Retryable if retries + 1 < policy.max_attempts => {
                    let delay = policy.delay(retries);
                    tracing::debug!(code = %error.code, retry = retries + 1, ?delay, "retrying provider call");
                    std::thread::sleep(delay);
                    retries += 1;
                }
                ErrorClass::Retryable => {
                    return Attempted {
                        result: Err((ErrorClass::Fatal, error)),
                        retries,
                    }
                }
                class => {
                    return Attempted {
                        result: Err((class, error)),
                        retries,
                    }
                }
            },
        }
    }
}
