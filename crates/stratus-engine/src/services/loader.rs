//! Compiles raw service specs into typed descriptors.

use stratus_core::config::{EdgeSpec, OperationSpec, ServiceSpec};
use stratus_core::errors::ConfigError;

use crate::params::ParameterResolverSpec;
use crate::selector::{Query, Selector};

/// A compiled service descriptor. All selectors and queries are parsed.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    pub key: String,
    pub service: String,
    pub label: String,
    pub arn_service: String,
    pub global: bool,
    pub bare_name_ids: bool,
    pub nodes: Vec<Selector>,
    pub edges: Vec<EdgeDescriptor>,
    pub iam_roles: Vec<Selector>,
    pub operations: Vec<OperationDescriptor>,
}

/// `state` is evaluated globally; `source`/`target` run against each item.
#[derive(Debug, Clone)]
pub struct EdgeDescriptor {
    pub name: String,
    pub state: Selector,
    pub source: Query,
    pub target: Query,
}

#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    pub operation: String,
    pub parameters: Vec<ParameterResolverSpec>,
}

impl OperationDescriptor {
    /// `(service, operation)` pairs this operation's parameters read from.
    pub fn dependencies(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters.iter().filter_map(|p| p.depends_on())
    }
}

pub fn load_from_str(toml_str: &str) -> Result<Vec<ServiceDescriptor>, ConfigError> {
    #[derive(serde::Deserialize)]
    struct Pack {
        #[serde(default)]
        services: Vec<ServiceSpec>,
    }
    let pack: Pack = toml::from_str(toml_str)?;
    pack.services.iter().map(compile).collect()
}

pub fn compile(spec: &ServiceSpec) -> Result<ServiceDescriptor, ConfigError> {
    if spec.key.trim().is_empty() {
        return Err(ConfigError::InvalidService {
            service: spec.effective_service().to_string(),
            reason: "missing `key`".into(),
        });
    }
    let key = spec.key.as_str();
    let selector = |raw: &str, what: &str| {
        Selector::parse(raw).map_err(|source| ConfigError::Selector {
            context: format!("service `{key}` {what}"),
            source,
        })
    };

    let nodes = spec
        .nodes
        .iter()
        .map(|raw| selector(raw, "nodes"))
        .collect::<Result<Vec<_>, _>>()?;
    let iam_roles = spec
        .iam_roles
        .iter()
        .map(|raw| selector(raw, "iam_roles"))
        .collect::<Result<Vec<_>, _>>()?;
    let edges = spec
        .edges
        .iter()
        .map(|edge| compile_edge(key, edge))
        .collect::<Result<Vec<_>, _>>()?;
    let operations = spec
        .operations
        .iter()
        .map(|op| compile_operation(spec.effective_service(), op))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ServiceDescriptor {
        key: key.to_string(),
        service: spec.effective_service().to_string(),
        label: spec.effective_label().to_string(),
        arn_service: spec.effective_arn_service().to_string(),
        global: spec.global,
        bare_name_ids: spec.bare_name_ids,
        nodes,
        edges,
        iam_roles,
        operations,
    })
}

fn compile_edge(key: &str, edge: &EdgeSpec) -> Result<EdgeDescriptor, ConfigError> {
    let context = |part: &str| format!("service `{key}` edge `{}` {part}", edge.name);
    if edge.name.trim().is_empty() {
        return Err(ConfigError::InvalidService {
            service: key.to_string(),
            reason: "edge without a name".into(),
        });
    }
    let query = |raw: &str, part: &str| {
        Query::parse(raw).map_err(|source| ConfigError::Selector {
            context: context(part),
            source,
        })
    };
    Ok(EdgeDescriptor {
        name: edge.name.clone(),
        state: Selector::parse(&edge.state).map_err(|source| ConfigError::Selector {
            context: context("state"),
            source,
        })?,
        source: query(&edge.source, "source")?,
        target: query(&edge.target, "target")?,
    })
}

fn compile_operation(service: &str, op: &OperationSpec) -> Result<OperationDescriptor, ConfigError> {
    if op.operation.trim().is_empty() {
        return Err(ConfigError::InvalidService {
            service: service.to_string(),
            reason: "operation without a name".into(),
        });
    }
    let parameters = op
        .parameters
        .iter()
        .map(|def| ParameterResolverSpec::compile(def, service, &op.operation))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(OperationDescriptor {
        operation: op.operation.clone(),
        parameters,
    })
}
