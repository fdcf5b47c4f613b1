//! Flat element list for visualization tooling.
//!
//! Element ids are sanitized; `data.id`, `data.source` and `data.target`
//! keep the semantic ids.

use serde::Serialize;
use serde_json::{Map, Value};

use super::types::{sanitize_id, Graph, GraphEdge, GraphNode};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "group")]
pub enum Element {
    #[serde(rename = "nodes")]
    Node {
        id: String,
        data: NodeData,
        #[serde(skip_serializing_if = "Map::is_empty")]
        metadata: Map<String, Value>,
    },
    #[serde(rename = "edges")]
    Edge {
        id: String,
        data: EdgeData,
        metadata: Map<String, Value>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeData {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeData {
    pub id: String,
    pub name: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: &'static str,
}

impl From<&GraphNode> for Element {
    fn from(node: &GraphNode) -> Self {
        Element::Node {
            id: sanitize_id(&node.id),
            data: NodeData {
                id: node.id.clone(),
                node_type: node.node_type.clone(),
                parent: node.parent.clone(),
            },
            metadata: node.metadata.clone(),
        }
    }
}

impl From<&GraphEdge> for Element {
    fn from(edge: &GraphEdge) -> Self {
        let mut metadata = edge.metadata.clone();
        metadata
            .entry("label")
            .or_insert_with(|| Value::String(edge.name.clone()));
        Element::Edge {
            id: edge.id.clone(),
            data: EdgeData {
                id: edge.id.clone(),
                name: edge.name.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                edge_type: "edge",
            },
            metadata,
        }
    }
}

impl Graph {
    /// Nodes first, then edges, each in assembly order.
    pub fn to_elements(&self) -> Vec<Element> {
        self.nodes()
            .iter()
            .map(Element::from)
            .chain(self.edges().iter().map(Element::from))
            .collect()
    }

    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self.to_elements())
    }
}
