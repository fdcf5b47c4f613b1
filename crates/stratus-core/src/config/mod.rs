//! Configuration: one TOML document with `[scan]`, `[graph]`, `[logging]`
//! sections and a `[[services]]` array of declarative service descriptors.

pub mod graph_config;
pub mod logging_config;
pub mod scan_config;
pub mod service_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub use graph_config::GraphConfig;
pub use logging_config::LoggingConfig;
pub use scan_config::{RetryConfig, ScanConfig};
pub use service_config::{EdgeSpec, OperationSpec, ParameterSpecDef, ServiceSpec};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StratusConfig {
    pub scan: ScanConfig,
    pub graph: GraphConfig,
    pub logging: LoggingConfig,
    pub services: Vec<ServiceSpec>,
}

impl StratusConfig {
    /// Parse a config from a TOML string. Selector syntax is checked later,
    /// when the engine compiles the service catalog.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(
            path = %path.display(),
            services = config.services.len(),
            "loaded config"
        );
        Ok(config)
    }
}
