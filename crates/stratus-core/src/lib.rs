//! # stratus-core
//!
//! Foundation crate for the Stratus resource-graph engine.
//! Defines scan record types, the state store contract, errors, config, and tracing.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod errors;
pub mod tracing;
pub mod traits;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::StratusConfig;
pub use errors::error_code::StratusErrorCode;
pub use traits::StateStore;
pub use types::collections::{FxHashMap, FxHashSet};
pub use types::scan::{RecordMetadata, ScanKey, ScanRecord, ScanScope};
