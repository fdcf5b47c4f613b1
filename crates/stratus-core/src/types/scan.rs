//! Scan record types: what one API invocation leaves behind in the state store.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Concrete request parameters used for one call.
pub type ParameterObject = Map<String, Value>;

/// Where and when a record was captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub account: String,
    pub region: String,
    /// Unix seconds.
    pub timestamp: u64,
}

impl RecordMetadata {
    /// Metadata stamped with the current wall-clock time.
    pub fn now(account: impl Into<String>, region: impl Into<String>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            account: account.into(),
            region: region.into(),
            timestamp,
        }
    }
}

/// One persisted result of a single API invocation (one page, or one
/// parameter-object iteration). Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub metadata: RecordMetadata,
    #[serde(default)]
    pub parameters: ParameterObject,
    pub result: Value,
}

impl ScanRecord {
    pub fn new(metadata: RecordMetadata, parameters: ParameterObject, result: Value) -> Self {
        Self {
            metadata,
            parameters,
            result,
        }
    }
}

/// Address of one record sequence in the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScanKey {
    pub account: String,
    pub region: String,
    pub service: String,
    pub operation: String,
}

impl ScanKey {
    pub fn new(
        account: impl Into<String>,
        region: impl Into<String>,
        service: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            region: region.into(),
            service: service.into(),
            operation: operation.into(),
        }
    }
}

impl fmt::Display for ScanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}|{}",
            self.account, self.region, self.service, self.operation
        )
    }
}

/// The scope a selector is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScanScope {
    /// A single (account, region).
    Scoped { account: String, region: String },
    /// Every account and region written so far.
    Global,
}

impl ScanScope {
    pub fn scoped(account: impl Into<String>, region: impl Into<String>) -> Self {
        Self::Scoped {
            account: account.into(),
            region: region.into(),
        }
    }
}

impl fmt::Display for ScanScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scoped { account, region } => write!(f, "{account}/{region}"),
            Self::Global => write!(f, "global"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_serializes_with_wire_field_names() {
        let record = ScanRecord::new(
            RecordMetadata {
                account: "111".into(),
                region: "us-east-1".into(),
                timestamp: 42,
            },
            Map::new(),
            json!({"Buckets": []}),
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["metadata"]["account"], "111");
        assert_eq!(value["metadata"]["timestamp"], 42);
        assert_eq!(value["parameters"], json!({}));
        assert_eq!(value["result"]["Buckets"], json!([]));
    }

    #[test]
    fn test_scan_key_ordering_groups_by_account_then_region() {
        let a = ScanKey::new("1", "eu-west-1", "S3", "ListBuckets");
        let b = ScanKey::new("1", "us-east-1", "Lambda", "ListFunctions");
        let c = ScanKey::new("2", "ap-south-1", "Lambda", "ListFunctions");
        let mut keys = vec![c.clone(), b.clone(), a.clone()];
        keys.sort();
        assert_eq!(keys, vec![a, b, c]);
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(ScanScope::scoped("1", "us-east-1").to_string(), "1/us-east-1");
        assert_eq!(ScanScope::Global.to_string(), "global");
    }
}
