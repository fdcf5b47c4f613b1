//! Role records and the role store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stratus_core::errors::{EvalError, PolicyError};
use stratus_core::{FxHashMap, ScanScope};

use super::document::{decode_statements, Statement};
use crate::selector::{Selector, SelectorEngine};

#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    pub name: String,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleRecord {
    pub role_arn: String,
    pub role_name: String,
    pub inline_policies: Vec<Policy>,
    pub attached_policies: Vec<Policy>,
}

impl RoleRecord {
    /// Read a role from either the normalized shape (`roleArn`,
    /// `inlinePolicies`, ...) or the raw IAM shape (`Arn`, `RolePolicyList`,
    /// `AttachedManagedPolicies`). Undecodable policies are logged and skipped.
    pub fn from_value(value: &Value) -> Result<Self, PolicyError> {
        let role_arn = first_str(value, &["roleArn", "RoleArn", "Arn"])
            .ok_or(PolicyError::MissingField { field: "roleArn" })?
            .to_string();
        let role_name = first_str(value, &["roleName", "RoleName"])
            .map(str::to_string)
            .unwrap_or_else(|| role_arn.rsplit('/').next().unwrap_or(&role_arn).to_string());

        let inline_policies = policies(value, &["inlinePolicies", "RolePolicyList"], &role_arn);
        let attached_policies = policies(
            value,
            &["attachedPolicies", "AttachedManagedPolicies", "AttachedPolicies"],
            &role_arn,
        );

        Ok(Self {
            role_arn,
            role_name,
            inline_policies,
            attached_policies,
        })
    }

    pub fn policies(&self) -> impl Iterator<Item = &Policy> {
        self.inline_policies.iter().chain(&self.attached_policies)
    }
}

fn first_str<'v>(value: &'v Value, keys: &[&str]) -> Option<&'v str> {
    keys.iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
}

fn policies(value: &Value, keys: &[&str], role_arn: &str) -> Vec<Policy> {
    let Some(list) = keys.iter().find_map(|k| value.get(*k).and_then(Value::as_array)) else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(list.len());
    for entry in list {
        let name = first_str(entry, &["name", "PolicyName"]).unwrap_or("policy");
        let document = ["document", "PolicyDocument"]
            .iter()
            .find_map(|k| entry.get(*k));
        let Some(document) = document else {
            tracing::debug!(role = role_arn, policy = name, "policy without a document");
            continue;
        };
        match decode_statements(name, document) {
            Ok(statements) => out.push(Policy {
                name: name.to_string(),
                statements,
            }),
            Err(e) => tracing::warn!(role = role_arn, policy = name, error = %e, "skipping undecodable policy"),
        }
    }
    out
}

/// All roles for a scan, keyed by ARN. Fully hydrated before any role-based
/// edge resolution and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct RoleStore {
    roles: FxHashMap<String, RoleRecord>,
}

impl RoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate `selector` globally; every item that reads as a role is stored.
    pub fn hydrate(engine: &SelectorEngine<'_>, selector: &Selector) -> Result<Self, EvalError> {
        let mut store = Self::new();
        for item in engine.evaluate(&ScanScope::Global, selector)? {
            match RoleRecord::from_value(&item) {
                Ok(role) => store.insert(role),
                Err(e) => tracing::warn!(error = %e, "skipping unreadable role record"),
            }
        }
        tracing::debug!(roles = store.len(), selector = %selector, "role store hydrated");
        Ok(store)
    }

    pub fn insert(&mut self, role: RoleRecord) {
        self.roles.insert(role.role_arn.clone(), role);
    }

    pub fn get(&self, role_arn: &str) -> Option<&RoleRecord> {
        self.roles.get(role_arn)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// A `{roleArn, executor}` pair: the executor acts with the role's permissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleBinding {
    #[serde(rename = "roleArn")]
    pub role_arn: String,
    pub executor: String,
}

impl RoleBinding {
    pub fn new(role_arn: impl Into<String>, executor: impl Into<String>) -> Self {
        Self {
            role_arn: role_arn.into(),
            executor: executor.into(),
        }
    }
}
