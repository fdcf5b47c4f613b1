//! Error types for every Stratus subsystem.
//!
//! Each enum implements [`StratusErrorCode`] so callers can match on a stable
//! string code without depending on the display text.

pub mod config_error;
pub mod error_code;
pub mod eval_error;
pub mod graph_error;
pub mod policy_error;
pub mod scan_error;
pub mod selector_error;
pub mod storage_error;

pub use config_error::ConfigError;
pub use error_code::StratusErrorCode;
pub use eval_error::EvalError;
pub use graph_error::GraphError;
pub use policy_error::PolicyError;
pub use scan_error::ScanError;
pub use selector_error::SelectorError;
pub use storage_error::StorageError;
