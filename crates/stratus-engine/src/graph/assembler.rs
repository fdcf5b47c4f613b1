//! GraphAssembler: turns scanned state into a validated, deduplicated graph.
//!
//! Phase 1 (nodes): account/region containment, then every service's node
//! selectors, in parallel via rayon, building the ServiceNodeIndex.
//! Phase 2 (edges): declarative edges, IAM-role edges, custom generators.
//! Phase 2 starts only once phase 1 has finished for every service, so glob
//! resolution and endpoint validation see the complete index.
//!
//! Nothing here aborts: empty or failing selectors contribute nothing and
//! are logged.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde_json::Value;
use stratus_core::config::GraphConfig;
use stratus_core::errors::{ConfigError, EvalError};
use stratus_core::{FxHashSet, ScanScope, StateStore};

use super::index::ServiceNodeIndex;
use super::manifest::ScanManifest;
use super::types::{Graph, GraphEdge, GraphNode};
use crate::generators::{GeneratorContext, GeneratorRegistry};
use crate::policy::{PolicyEdgeResolver, ResourceResolver, RoleBinding, RoleStore};
use crate::selector::engine::search_sequence;
use crate::selector::{Selector, SelectorEngine};
use crate::services::{EdgeDescriptor, ServiceCatalog, ServiceDescriptor, TranslatorSet};

pub const ACCOUNT_NODE_TYPE: &str = "account";
pub const REGION_NODE_TYPE: &str = "region";

/// Containment id of a region node.
pub fn region_node_id(account: &str, region: &str) -> String {
    format!("{account}:{region}")
}

/// Counters from one assembly run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    pub accounts: usize,
    pub nodes: usize,
    pub duplicate_nodes: usize,
    pub edges_proposed: usize,
    pub edges_pruned: usize,
    pub duplicate_edges: usize,
    pub edges: usize,
    pub roles: usize,
    pub duration: Duration,
}

pub struct GraphAssembler<'a> {
    store: &'a dyn StateStore,
    catalog: &'a ServiceCatalog,
    generators: GeneratorRegistry,
    translators: TranslatorSet,
    role_selector: Selector,
    partition: String,
    parallel: bool,
}

impl<'a> GraphAssembler<'a> {
    /// Fails if the configured role selector or a builtin generator selector
    /// is malformed.
    pub fn new(
        store: &'a dyn StateStore,
        catalog: &'a ServiceCatalog,
        config: &GraphConfig,
    ) -> Result<Self, ConfigError> {
        let role_selector =
            Selector::parse(config.effective_role_selector()).map_err(|source| ConfigError::Selector {
                context: "graph.role_selector".into(),
                source,
            })?;
        let generators = GeneratorRegistry::with_builtins().map_err(|source| ConfigError::Selector {
            context: "generators".into(),
            source,
        })?;
        Ok(Self {
            store,
            catalog,
            generators,
            translators: TranslatorSet::default(),
            role_selector,
            partition: config.effective_partition().to_string(),
            parallel: true,
        })
    }

    pub fn with_generators(mut self, generators: GeneratorRegistry) -> Self {
        self.generators = generators;
        self
    }

    pub fn with_translators(mut self, translators: TranslatorSet) -> Self {
        self.translators = translators;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Build the graph for every account in `manifest`. Must run after all
    /// scanning for those accounts has finished.
    pub fn assemble(&self, manifest: &ScanManifest) -> (Graph, AssemblyStats) {
        let start = Instant::now();
        let engine = SelectorEngine::new(self.store);
        let mut stats = AssemblyStats {
            accounts: manifest.accounts.len(),
            ..AssemblyStats::default()
        };

        // Phase 1: nodes. The index is built from the survivors of dedupe so
        // globs never resolve to a dropped node.
        let mut tagged: Vec<(Option<String>, GraphNode)> =
            containment_nodes(manifest).into_iter().map(|n| (None, n)).collect();
        tagged.extend(self.service_nodes(&engine, manifest));
        let (tagged, duplicate_nodes) = dedupe_nodes(tagged);
        stats.duplicate_nodes = duplicate_nodes;
        let mut index = ServiceNodeIndex::new();
        let mut nodes = Vec::with_capacity(tagged.len());
        for (service, node) in tagged {
            if let Some(service) = service {
                index.insert(&service, node.id.clone());
            }
            nodes.push(node);
        }

        // Roles must be complete before any role-based resolution.
        let roles = match RoleStore::hydrate(&engine, &self.role_selector) {
            Ok(roles) => roles,
            Err(e) => {
                tracing::warn!(error = %e, "role hydration failed; no role-based edges");
                RoleStore::new()
            }
        };
        stats.roles = roles.len();

        // Phase 2: edges.
        let resolver = PolicyEdgeResolver::new(
            &roles,
            ResourceResolver::new(self.catalog, &index, &self.partition),
        );
        let mut edges = Vec::new();
        for descriptor in self.catalog.iter() {
            for edge in &descriptor.edges {
                edges.extend(declarative_edges(&engine, descriptor, edge));
            }
        }
        for binding in self.role_bindings(&engine) {
            edges.extend(resolver.edges_for_role(&binding.role_arn, &binding.executor));
        }
        let ctx = GeneratorContext::new(engine, &roles);
        for generator in self.generators.iter() {
            match generator.generate(&ctx) {
                Ok(output) => {
                    tracing::debug!(
                        generator = generator.name(),
                        edges = output.edges.len(),
                        role_bindings = output.role_bindings.len(),
                        "generator finished"
                    );
                    edges.extend(output.edges);
                    for binding in output.role_bindings {
                        edges.extend(resolver.edges_for_role(&binding.role_arn, &binding.executor));
                    }
                }
                Err(e) => tracing::warn!(generator = generator.name(), error = %e, "edge generator failed"),
            }
        }
        stats.edges_proposed = edges.len();

        // Validate endpoints, then dedupe by edge id.
        let known: FxHashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut kept = Vec::with_capacity(edges.len());
        for edge in edges {
            if !known.contains(edge.source.as_str()) || !known.contains(edge.target.as_str()) {
                tracing::debug!(source = %edge.source, target = %edge.target, name = %edge.name, "pruned edge with unknown endpoint");
                stats.edges_pruned += 1;
                continue;
            }
            if !seen.insert(edge.id.clone()) {
                stats.duplicate_edges += 1;
                continue;
            }
            kept.push(edge);
        }

        stats.nodes = nodes.len();
        stats.edges = kept.len();
        stats.duration = start.elapsed();
        tracing::info!(
            accounts = stats.accounts,
            nodes = stats.nodes,
            edges = stats.edges,
            pruned = stats.edges_pruned,
            "graph assembled"
        );
        (Graph::from_parts(nodes, kept), stats)
    }

    /// Every service's node selectors, per account and scope, each node
    /// tagged with its service key. Output order is deterministic regardless
    /// of `parallel`.
    fn service_nodes(
        &self,
        engine: &SelectorEngine<'_>,
        manifest: &ScanManifest,
    ) -> Vec<(Option<String>, GraphNode)> {
        let mut tasks: Vec<NodeTask<'_>> = Vec::new();
        for account in &manifest.accounts {
            for descriptor in self.catalog.iter().filter(|d| !d.nodes.is_empty()) {
                if descriptor.global {
                    tasks.push(NodeTask {
                        descriptor,
                        scope: ScanScope::scoped(&account.account_id, &manifest.default_region),
                        container: account.account_id.clone(),
                    });
                } else {
                    for region in &account.regions {
                        tasks.push(NodeTask {
                            descriptor,
                            scope: ScanScope::scoped(&account.account_id, region),
                            container: region_node_id(&account.account_id, region),
                        });
                    }
                }
            }
        }

        let batches: Vec<Vec<GraphNode>> = if self.parallel {
            tasks.par_iter().map(|task| self.nodes_for(engine, task)).collect()
        } else {
            tasks.iter().map(|task| self.nodes_for(engine, task)).collect()
        };

        tasks
            .iter()
            .zip(batches)
            .flat_map(|(task, batch)| {
                batch
                    .into_iter()
                    .map(move |node| (Some(task.descriptor.key.clone()), node))
            })
            .collect()
    }

    fn nodes_for(&self, engine: &SelectorEngine<'_>, task: &NodeTask<'_>) -> Vec<GraphNode> {
        let NodeTask {
            descriptor,
            scope,
            container,
        } = task;
        let mut nodes = Vec::new();
        for selector in &descriptor.nodes {
            let items = match engine.evaluate(scope, selector) {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(service = %descriptor.key, scope = %scope, selector = %selector, error = %e, "node selector failed");
                    continue;
                }
            };
            for item in &items {
                let Some(translated) = self.translators.translate(&descriptor.key, item) else {
                    tracing::debug!(service = %descriptor.key, "skipping node item without an id");
                    continue;
                };
                nodes.push(GraphNode {
                    id: translated.id,
                    node_type: descriptor.label.clone(),
                    parent: Some(translated.parent.unwrap_or_else(|| container.clone())),
                    metadata: translated.metadata,
                });
            }
        }
        nodes
    }

    fn role_bindings(&self, engine: &SelectorEngine<'_>) -> Vec<RoleBinding> {
        let mut bindings = Vec::new();
        for descriptor in self.catalog.iter() {
            for selector in &descriptor.iam_roles {
                let items = match engine.evaluate(&ScanScope::Global, selector) {
                    Ok(items) => items,
                    Err(e) => {
                        tracing::warn!(service = %descriptor.key, selector = %selector, error = %e, "iam role selector failed");
                        continue;
                    }
                };
                for item in items {
                    match serde_json::from_value::<RoleBinding>(item) {
                        Ok(binding) => bindings.push(binding),
                        Err(e) => tracing::debug!(service = %descriptor.key, error = %e, "skipping malformed role binding"),
                    }
                }
            }
        }
        bindings
    }
}

/// One (service, scope) slice of node generation.
struct NodeTask<'d> {
    descriptor: &'d ServiceDescriptor,
    scope: ScanScope,
    /// Default parent: the region node, or the account for global services.
    container: String,
}

fn containment_nodes(manifest: &ScanManifest) -> Vec<GraphNode> {
    let mut nodes = Vec::new();
    for account in &manifest.accounts {
        nodes.push(GraphNode::new(&account.account_id, ACCOUNT_NODE_TYPE));
        for region in &account.regions {
            nodes.push(
                GraphNode::new(region_node_id(&account.account_id, region), REGION_NODE_TYPE)
                    .with_parent(&account.account_id),
            );
        }
    }
    nodes
}

/// First write wins on sanitized-id collisions.
fn dedupe_nodes<T>(nodes: Vec<(T, GraphNode)>) -> (Vec<(T, GraphNode)>, usize) {
    let mut seen = FxHashSet::default();
    let mut kept = Vec::with_capacity(nodes.len());
    let mut duplicates = 0;
    for (tag, node) in nodes {
        if seen.insert(node.sanitized_id()) {
            kept.push((tag, node));
        } else {
            tracing::warn!(id = %node.id, node_type = %node.node_type, "node id collision; keeping first");
            duplicates += 1;
        }
    }
    (kept, duplicates)
}

/// Evaluate one declarative edge: `state` globally, then `source` and
/// `target` against each item.
fn declarative_edges(
    engine: &SelectorEngine<'_>,
    descriptor: &ServiceDescriptor,
    edge: &EdgeDescriptor,
) -> Vec<GraphEdge> {
    let items = match engine.evaluate(&ScanScope::Global, &edge.state) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(service = %descriptor.key, edge = %edge.name, error = %e, "edge state selector failed");
            return Vec::new();
        }
    };

    let mut edges = Vec::new();
    for item in &items {
        match edges_for_item(edge, item) {
            Ok(found) => edges.extend(found),
            Err(e) => {
                tracing::debug!(service = %descriptor.key, edge = %edge.name, error = %e, "edge query failed for item")
            }
        }
    }
    edges
}

fn edges_for_item(edge: &EdgeDescriptor, item: &Value) -> Result<Vec<GraphEdge>, EvalError> {
    let Some(source) = search_sequence(&edge.source, item)?
        .into_iter()
        .find_map(|v| v.as_str().map(str::to_string))
    else {
        return Ok(Vec::new());
    };

    let mut edges = Vec::new();
    for target in search_sequence(&edge.target, item)? {
        let (target, name) = match &target {
            Value::String(t) => (t.clone(), edge.name.clone()),
            Value::Object(o) => {
                let Some(t) = o.get("target").and_then(Value::as_str) else {
                    continue;
                };
                let name = o
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or(&edge.name)
                    .to_string();
                (t.to_string(), name)
            }
            _ => continue,
        };
        if target.is_empty() {
            continue;
        }
        edges.push(
            GraphEdge::new(source.clone(), target, name.clone()).with_metadata("label", Value::String(name)),
        );
    }
    Ok(edges)
}
