//! Graph model: nodes, edges, and the assembled graph.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use stratus_core::FxHashMap;

/// Replace characters downstream visualization tooling rejects in ids.
pub fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| match c {
            ':' | '/' | '\\' | '.' => '_',
            other => other,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Semantic id; edges reference this. The sanitized form is the primary key.
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    /// Containment, not a graph edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            parent: None,
            metadata: Map::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn sanitized_id(&self) -> String {
        sanitize_id(&self.id)
    }
}

/// A directed edge: `source` acts on `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// `sanitize(source + ":" + target)`.
    pub id: String,
    pub source: String,
    pub target: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, name: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: sanitize_id(&format!("{source}:{target}")),
            source,
            target,
            name: name.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// The assembled, validated, deduplicated graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    by_id: FxHashMap<String, usize>,
}

impl Graph {
    /// Callers guarantee node ids are unique and edge endpoints exist.
    pub(crate) fn from_parts(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        let by_id = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        Self { nodes, edges, by_id }
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id.as_str())
    }

    pub fn find_node(&self, id: &str) -> Option<&GraphNode> {
        self.by_id.get(id).map(|&i| &self.nodes[i])
    }

    pub fn find_edge(&self, source: &str, target: &str) -> Option<&GraphEdge> {
        self.edges
            .iter()
            .find(|e| e.source == source && e.target == target)
    }

    pub fn edges_from<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == source)
    }

    pub fn edges_to<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == target)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
