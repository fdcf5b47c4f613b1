//! Stable error codes shared across crates.

/// Implemented by every Stratus error enum.
pub trait StratusErrorCode {
    /// Machine-readable code, stable across releases.
    fn error_code(&self) -> &'static str;
}

pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const STORAGE_LOCK_POISONED: &str = "STORAGE_LOCK_POISONED";
pub const SELECTOR_MALFORMED: &str = "SELECTOR_MALFORMED";
pub const QUERY_SYNTAX: &str = "QUERY_SYNTAX";
pub const QUERY_RUNTIME: &str = "QUERY_RUNTIME";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const CONFIG_DEPENDENCY_CYCLE: &str = "CONFIG_DEPENDENCY_CYCLE";
pub const POLICY_DECODE: &str = "POLICY_DECODE";
pub const GRAPH_ERROR: &str = "GRAPH_ERROR";
pub const IDENTITY_RESOLUTION: &str = "IDENTITY_RESOLUTION";
pub const SCAN_ERROR: &str = "SCAN_ERROR";
