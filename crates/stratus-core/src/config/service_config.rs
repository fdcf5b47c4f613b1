//! Declarative service descriptors: the TOML schema.
//!
//! These are raw strings; `stratus-engine` compiles them into a typed
//! catalog and rejects malformed selectors at load time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One `[[services]]` table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceSpec {
    /// Unique key; also the ServiceNodeIndex label (e.g. "lambda").
    pub key: String,
    /// Service name used in selectors and store keys (e.g. "Lambda"). Default: `key`.
    pub service: Option<String>,
    /// Node type label. Default: `key`.
    pub label: Option<String>,
    /// ARN service segment owned by this service (e.g. "lambda"). Default: `key`.
    pub arn_service: Option<String>,
    /// Scanned once per account in the default region.
    pub global: bool,
    /// Node ids are bare names rather than ARNs (S3 buckets).
    pub bare_name_ids: bool,
    /// Node-producing selectors.
    pub nodes: Vec<String>,
    /// Declarative edges.
    pub edges: Vec<EdgeSpec>,
    /// Selectors producing `{roleArn, executor}` pairs.
    pub iam_roles: Vec<String>,
    /// Dependent scan operations and how their parameters are derived.
    pub operations: Vec<OperationSpec>,
}

impl ServiceSpec {
    pub fn effective_service(&self) -> &str {
        self.service.as_deref().unwrap_or(&self.key)
    }

    pub fn effective_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }

    pub fn effective_arn_service(&self) -> &str {
        self.arn_service.as_deref().unwrap_or(&self.key)
    }
}

/// A declarative edge: `state` is a full selector evaluated globally,
/// `source` and `target` are bare queries applied to each resulting item.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EdgeSpec {
    pub name: String,
    pub state: String,
    pub source: String,
    pub target: String,
}

/// A scan operation and its parameter derivation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OperationSpec {
    pub operation: String,
    pub parameters: Vec<ParameterSpecDef>,
}

/// Raw `{Key, Selector?, Value?}` parameter resolver spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpecDef {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Selector", default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(rename = "Value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}
