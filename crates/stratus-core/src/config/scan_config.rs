//! Scanner configuration.

use serde::{Deserialize, Serialize};

/// Provider error codes treated as "sub-configuration absent".
pub const DEFAULT_IGNORABLE_CODES: &[&str] = &[
    "NoSuchWebsiteConfiguration",
    "NoSuchBucketPolicy",
    "NoSuchTagSet",
    "NoSuchCORSConfiguration",
    "NoSuchLifecycleConfiguration",
    "ServerSideEncryptionConfigurationNotFoundError",
    "ResourceNotFoundException",
];

/// Provider error codes worth retrying.
pub const DEFAULT_RETRYABLE_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
    "ServiceUnavailable",
    "InternalError",
];

/// Configuration for the scan pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScanConfig {
    /// Regions to scan. Default: the default region only.
    pub regions: Vec<String>,
    /// Region global services are scanned in. Default: "us-east-1".
    pub default_region: Option<String>,
    /// Extra error codes recorded as absence rather than failure.
    pub ignorable_error_codes: Vec<String>,
    /// Extra error codes retried with backoff.
    pub retryable_error_codes: Vec<String>,
    /// Scan regions and independent operations concurrently. Default: true.
    pub parallel: Option<bool>,
    pub retry: RetryConfig,
}

impl ScanConfig {
    pub fn effective_default_region(&self) -> &str {
        self.default_region.as_deref().unwrap_or("us-east-1")
    }

    /// Configured regions, or just the default region when none are listed.
    pub fn effective_regions(&self) -> Vec<String> {
        if self.regions.is_empty() {
            vec![self.effective_default_region().to_string()]
        } else {
            self.regions.clone()
        }
    }

    pub fn effective_parallel(&self) -> bool {
        self.parallel.unwrap_or(true)
    }
}

/// Exponential backoff settings for retryable provider errors.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first. Default: 3.
    pub max_attempts: Option<u32>,
    /// Delay before the first retry. Default: 200ms.
    pub base_delay_ms: Option<u64>,
    /// Upper bound for any single delay. Default: 5000ms.
    pub max_delay_ms: Option<u64>,
}

impl RetryConfig {
    pub fn effective_max_attempts(&self) -> u32 {
        self.max_attempts.unwrap_or(3).max(1)
    }

    pub fn effective_base_delay_ms(&self) -> u64 {
        self.base_delay_ms.unwrap_or(200)
    }

    pub fn effective_max_delay_ms(&self) -> u64 {
        self.max_delay_ms.unwrap_or(5_000)
    }
}
