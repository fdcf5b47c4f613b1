//! Graph assembly.
//!
//! - `types.rs`: `GraphNode`, `GraphEdge`, `Graph`, id sanitization
//! - `index.rs`: `ServiceNodeIndex`
//! - `manifest.rs`: `ScanManifest`: the accounts and regions a build covers
//! - `assembler.rs`: `GraphAssembler`
//! - `output.rs`: the flat element list

pub mod assembler;
pub mod index;
pub mod manifest;
pub mod output;
pub mod types;

pub use assembler::{region_node_id, AssemblyStats, GraphAssembler};
pub use index::ServiceNodeIndex;
pub use manifest::{AccountScope, ScanManifest};
pub use output::Element;
pub use types::{sanitize_id, Graph, GraphEdge, GraphNode};
