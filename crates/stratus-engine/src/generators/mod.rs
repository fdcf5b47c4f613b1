//! Custom edge generators: cross-service correlations the declarative edge
//! list cannot express.
//!
//! A generator sees only the global selector engine and the role store, never
//! assembler state, so each one is testable against a bare state store.
//!
//! - `route53.rs`: alias records to CloudFront, S3 website buckets, load balancers
//! - `cloudfront.rs`: distribution origins to S3 buckets
//! - `ecs.rs`: services to load balancers, services/tasks to task roles

pub mod cloudfront;
pub mod ecs;
pub mod route53;

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use stratus_core::errors::{EvalError, GraphError, SelectorError};
use stratus_core::ScanScope;

use crate::graph::types::GraphEdge;
use crate::policy::{RoleBinding, RoleStore};
use crate::selector::{Selector, SelectorEngine};

pub use cloudfront::CloudFrontOriginGenerator;
pub use ecs::{EcsLoadBalancerGenerator, EcsTaskRoleGenerator};
pub use route53::Route53AliasGenerator;

/// What a generator read access is limited to.
#[derive(Clone, Copy)]
pub struct GeneratorContext<'a> {
    engine: SelectorEngine<'a>,
    roles: &'a RoleStore,
}

impl<'a> GeneratorContext<'a> {
    pub fn new(engine: SelectorEngine<'a>, roles: &'a RoleStore) -> Self {
        Self { engine, roles }
    }

    /// Evaluate a selector in global scope.
    pub fn evaluate(&self, selector: &Selector) -> Result<Vec<Value>, EvalError> {
        self.engine.evaluate(&ScanScope::Global, selector)
    }

    pub fn roles(&self) -> &'a RoleStore {
        self.roles
    }

    /// Every region the store holds records for.
    pub fn known_regions(&self) -> Result<BTreeSet<String>, EvalError> {
        Ok(self
            .engine
            .store()
            .scopes()?
            .into_iter()
            .map(|(_, region)| region)
            .collect())
    }
}

/// Edges plus role bindings to be resolved through role policies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratorOutput {
    pub edges: Vec<GraphEdge>,
    pub role_bindings: Vec<RoleBinding>,
}

impl GeneratorOutput {
    pub fn extend(&mut self, other: GeneratorOutput) {
        self.edges.extend(other.edges);
        self.role_bindings.extend(other.role_bindings);
    }
}

pub trait EdgeGenerator: Send + Sync {
    fn name(&self) -> &str;

    fn generate(&self, ctx: &GeneratorContext<'_>) -> Result<GeneratorOutput, GraphError>;
}

/// Registered generators, run in registration order.
#[derive(Clone, Default)]
pub struct GeneratorRegistry {
    generators: Vec<Arc<dyn EdgeGenerator>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Result<Self, SelectorError> {
        let mut registry = Self::new();
        registry.register(Arc::new(Route53AliasGenerator::builtin()?));
        registry.register(Arc::new(CloudFrontOriginGenerator::builtin()?));
        registry.register(Arc::new(EcsLoadBalancerGenerator::builtin()?));
        registry.register(Arc::new(EcsTaskRoleGenerator::builtin()?));
        Ok(registry)
    }

    pub fn register(&mut self, generator: Arc<dyn EdgeGenerator>) {
        self.generators.push(generator);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn EdgeGenerator>> {
        self.generators.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

/// Lowercase, without the trailing root dot.
pub(crate) fn normalize_dns(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

pub(crate) fn str_field<'v>(item: &'v Value, key: &str) -> Option<&'v str> {
    item.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// A field holding a string or an array of strings.
pub(crate) fn str_list<'v>(item: &'v Value, key: &str) -> Vec<&'v str> {
    match item.get(key) {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}
