//! Graph assembly configuration.

use serde::{Deserialize, Serialize};

/// Default selector producing role records from the globally scanned IAM data.
pub const DEFAULT_ROLE_SELECTOR: &str = "IAM|ListRoles|[*].result.Roles[]";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GraphConfig {
    /// Selector whose items hydrate the role store.
    pub role_selector: Option<String>,
    /// ARN partition used when synthesizing ARNs. Default: "aws".
    pub partition: Option<String>,
}

impl GraphConfig {
    pub fn effective_role_selector(&self) -> &str {
        self.role_selector.as_deref().unwrap_or(DEFAULT_ROLE_SELECTOR)
    }

    pub fn effective_partition(&self) -> &str {
        self.partition.as_deref().unwrap_or("aws")
    }
}
