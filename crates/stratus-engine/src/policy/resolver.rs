//! Role/policy edge resolution.
//!
//! A role's statements name resources by exact ARN or by glob. Each resource
//! expression is resolved against the ids actually discovered for the
//! owning service; the resolver only proposes edges, endpoint validation
//! happens at assembly.

use glob::Pattern;
use serde_json::Value;

use super::role::RoleStore;
use crate::graph::index::ServiceNodeIndex;
use crate::graph::types::GraphEdge;
use crate::services::{ServiceCatalog, ServiceDescriptor};

/// Resolves resource expressions to known node ids.
pub struct ResourceResolver<'a> {
    catalog: &'a ServiceCatalog,
    index: &'a ServiceNodeIndex,
    partition: String,
}

impl<'a> ResourceResolver<'a> {
    pub fn new(catalog: &'a ServiceCatalog, index: &'a ServiceNodeIndex, partition: &str) -> Self {
        Self {
            catalog,
            index,
            partition: partition.to_string(),
        }
    }

    /// Node ids a resource expression refers to, in index order.
    ///
    /// `"*"` resolves to nothing. A resource containing `*` is matched as an
    /// unanchored glob (any substring position); anything else must equal a
    /// known id. Services with bare-name ids are matched in synthesized ARN
    /// form and mapped back to the bare name.
    pub fn resolve(&self, resource: &str) -> Vec<String> {
        let resource = resource.trim();
        if resource == "*" || resource.is_empty() {
            return Vec::new();
        }

        let Some(descriptor) = self.owning_service(resource) else {
            return Vec::new();
        };
        let Some(ids) = self.index.ids(&descriptor.key) else {
            return Vec::new();
        };

        let bare = descriptor.bare_name_ids;
        let subject = if bare {
            bucket_level(resource, &self.partition, &descriptor.arn_service)
        } else {
            resource.to_string()
        };
        let candidate = |id: &str| -> String {
            if bare {
                format!("arn:{}:{}:::{id}", self.partition, descriptor.arn_service)
            } else {
                id.to_string()
            }
        };

        if !subject.contains('*') {
            return ids
                .iter()
                .filter(|id| candidate(id.as_str()) == subject)
                .cloned()
                .collect();
        }

        let Some(pattern) = substring_pattern(&subject) else {
            tracing::warn!(resource, "resource glob does not compile");
            return Vec::new();
        };
        ids.iter()
            .filter(|id| pattern.matches(&candidate(id.as_str())))
            .cloned()
            .collect()
    }

    fn owning_service(&self, resource: &str) -> Option<&'a ServiceDescriptor> {
        let segment = resource.split(':').nth(2).filter(|s| !s.is_empty());
        let Some(segment) = segment else {
            tracing::warn!(resource, "resource is not an ARN; skipping");
            return None;
        };
        let descriptor = self.catalog.by_arn_service(segment);
        if descriptor.is_none() {
            tracing::warn!(resource, service = segment, "unsupported service in resource; skipping");
        }
        descriptor
    }
}

/// `arn:aws:s3:::bucket/key/*` → `arn:aws:s3:::bucket`, in the configured partition.
fn bucket_level(resource: &str, partition: &str, arn_service: &str) -> String {
    let name = resource.splitn(6, ':').nth(5).unwrap_or(resource);
    let bucket = name.split('/').next().unwrap_or(name);
    format!("arn:{partition}:{arn_service}:::{bucket}")
}

/// `*`-wrapped glob with everything except `*` and `?` matched literally.
/// Runs of `*` collapse to one; `glob` rejects a `**` that is not a whole
/// path component.
fn substring_pattern(resource: &str) -> Option<Pattern> {
    let mut glob = String::with_capacity(resource.len() + 2);
    glob.push('*');
    for c in resource.chars() {
        match c {
            '*' if glob.ends_with('*') => {}
            '*' | '?' => glob.push(c),
            '[' => glob.push_str("[[]"),
            ']' => glob.push_str("[]]"),
            other => glob.push(other),
        }
    }
    if !glob.ends_with('*') {
        glob.push('*');
    }
    Pattern::new(&glob).ok()
}

/// Emits `executor → resource` edges for a role's statements.
pub struct PolicyEdgeResolver<'a> {
    roles: &'a RoleStore,
    resources: ResourceResolver<'a>,
}

impl<'a> PolicyEdgeResolver<'a> {
    pub fn new(roles: &'a RoleStore, resources: ResourceResolver<'a>) -> Self {
        Self { roles, resources }
    }

    pub fn resources(&self) -> &ResourceResolver<'a> {
        &self.resources
    }

    /// Deny statements produce edges too; the effect is recorded in metadata.
    pub fn edges_for_role(&self, role_arn: &str, executor: &str) -> Vec<GraphEdge> {
        let Some(role) = self.roles.get(role_arn) else {
            tracing::warn!(role_arn, executor, "unknown role; no edges");
            return Vec::new();
        };

        let mut edges = Vec::new();
        for policy in role.policies() {
            for statement in &policy.statements {
                for resource in &statement.resources {
                    for target in self.resources.resolve(resource) {
                        if statement.is_deny() {
                            tracing::debug!(
                                role_arn,
                                policy = %policy.name,
                                target = %target,
                                "edge from Deny statement"
                            );
                        }
                        let mut edge = GraphEdge::new(executor, target, policy.name.clone())
                            .with_metadata("roleArn", Value::String(role_arn.to_string()))
                            .with_metadata("label", Value::String(policy.name.clone()))
                            .with_metadata("statement", statement.raw.clone());
                        if let Some(effect) = &statement.effect {
                            edge = edge.with_metadata("effect", Value::String(effect.clone()));
                        }
                        edges.push(edge);
                    }
                }
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_level_strips_object_path() {
        assert_eq!(
            bucket_level("arn:aws:s3:::logs-*/AWSLogs/*", "aws", "s3"),
            "arn:aws:s3:::logs-*"
        );
        assert_eq!(bucket_level("arn:aws:s3:::b", "aws", "s3"), "arn:aws:s3:::b");
    }

    #[test]
    fn test_substring_pattern_is_unanchored_and_literal() {
        let p = substring_pattern("table/app-*").unwrap();
        assert!(p.matches("arn:aws:dynamodb:us-east-1:1:table/app-users"));
        assert!(p.matches("arn:aws:dynamodb:us-east-1:1:table/app-users/index/x"));
        assert!(!p.matches("arn:aws:dynamodb:us-east-1:1:table/web-users"));

        let brackets = substring_pattern("a[1]*").unwrap();
        assert!(brackets.matches("xa[1]yz"));
        assert!(!brackets.matches("xa1yz"));
    }

    #[test]
    fn test_substring_pattern_accepts_leading_and_trailing_wildcards() {
        let trailing = substring_pattern("arn:aws:s3:::bucket-prefix-*").unwrap();
        assert!(trailing.matches("arn:aws:s3:::bucket-prefix-A"));
        assert!(!trailing.matches("arn:aws:s3:::other-A"));

        let leading = substring_pattern("*bucket").unwrap();
        assert!(leading.matches("arn:aws:s3:::my-bucket"));

        let runs = substring_pattern("arn:aws:sqs:**:111:***").unwrap();
        assert!(runs.matches("arn:aws:sqs:us-east-1:111:jobs"));
        assert!(substring_pattern("*").is_some());
    }
}
