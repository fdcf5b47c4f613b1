//! ScanPlan: orders operations so producers run before their consumers.
//!
//! Operations become petgraph nodes; an operation whose parameters read
//! `Service|Operation|...` gets an edge from that operation. A topological
//! sort groups them into levels: every operation in a level depends only on
//! operations in earlier levels.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use stratus_core::errors::ConfigError;
use stratus_core::FxHashMap;

use crate::params::ParameterResolverSpec;
use crate::services::ServiceCatalog;

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedOperation {
    pub service_key: String,
    pub service: String,
    pub operation: String,
    pub global: bool,
    pub parameters: Vec<ParameterResolverSpec>,
}

impl PlannedOperation {
    pub fn label(&self) -> String {
        format!("{}|{}", self.service, self.operation)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanPlan {
    levels: Vec<Vec<PlannedOperation>>,
}

impl ScanPlan {
    /// Plan every catalog operation `include` accepts. Dependencies on
    /// operations outside the plan are ignored: their data is simply absent.
    pub fn build(
        catalog: &ServiceCatalog,
        include: impl Fn(&str, &str) -> bool,
    ) -> Result<Self, ConfigError> {
        let mut graph: DiGraph<PlannedOperation, ()> = DiGraph::new();
        let mut by_name: FxHashMap<(String, String), NodeIndex> = FxHashMap::default();

        for descriptor in catalog.iter() {
            for op in &descriptor.operations {
                if !include(&descriptor.service, &op.operation) {
                    continue;
                }
                let key = (descriptor.service.clone(), op.operation.clone());
                if by_name.contains_key(&key) {
                    continue;
                }
                let index = graph.add_node(PlannedOperation {
                    service_key: descriptor.key.clone(),
                    service: descriptor.service.clone(),
                    operation: op.operation.clone(),
                    global: descriptor.global,
                    parameters: op.parameters.clone(),
                });
                by_name.insert(key, index);
            }
        }

        let consumers: Vec<NodeIndex> = graph.node_indices().collect();
        for consumer in consumers {
            let producers: Vec<NodeIndex> = graph[consumer]
                .parameters
                .iter()
                .filter_map(ParameterResolverSpec::depends_on)
                .filter_map(|(s, o)| by_name.get(&(s.to_string(), o.to_string())).copied())
                .collect();
            for producer in producers {
                graph.update_edge(producer, consumer, ());
            }
        }

        let order = toposort(&graph, None)
            .map_err(|cycle| ConfigError::DependencyCycle(graph[cycle.node_id()].label()))?;

        // Level = longest dependency chain leading to the operation.
        let mut level_of: FxHashMap<NodeIndex, usize> = FxHashMap::default();
        let mut levels: Vec<Vec<PlannedOperation>> = Vec::new();
        for index in order {
            let level = graph
                .neighbors_directed(index, petgraph::Direction::Incoming)
                .filter_map(|p| level_of.get(&p))
                .map(|l| l + 1)
                .max()
                .unwrap_or(0);
            level_of.insert(index, level);
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(graph[index].clone());
        }
        for level in &mut levels {
            level.sort_by(|a, b| (&a.service, &a.operation).cmp(&(&b.service, &b.operation)));
        }

        tracing::debug!(
            operations = graph.node_count(),
            levels = levels.len(),
            "scan plan built"
        );
        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[Vec<PlannedOperation>] {
        &self.levels
    }

    pub fn operation_count(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    /// Level index of an operation, if planned.
    pub fn level_of(&self, service: &str, operation: &str) -> Option<usize> {
        self.levels.iter().position(|level| {
            level
                .iter()
                .any(|op| op.service == service && op.operation == operation)
        })
    }
}
