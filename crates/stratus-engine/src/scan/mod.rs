//! Scan pipeline: drives external operation scanners in dependency order
//! and fills the state store.
//!
//! - `provider.rs`: `OperationScanner`, `IdentityResolver`, error classification
//! - `retry.rs`: exponential backoff for retryable errors
//! - `plan.rs`: petgraph dependency plan
//! - `pipeline.rs`: `ScanPipeline`

pub mod pipeline;
pub mod plan;
pub mod provider;
pub mod retry;

pub use pipeline::{ScanPipeline, ScanSummary};
pub use plan::{PlannedOperation, ScanPlan};
pub use provider::{ErrorClass, ErrorClassifier, IdentityResolver, OperationScanner, ProviderError, ScanContext};
pub use retry::{with_retry, RetryPolicy};
