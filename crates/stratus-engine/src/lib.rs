//! # stratus-engine
//!
//! Resource-graph construction over scanned cloud state:
//! - `selector`: `Service|Operation|Query` selectors and the query language
//! - `params`: dependent-parameter resolution (fan-out and broadcast)
//! - `policy`: role statements resolved into edges, with resource globbing
//! - `services`: the typed service catalog and node translators
//! - `graph`: the graph assembler and output elements
//! - `generators`: custom cross-service edge generators
//! - `scan`: the dependency-ordered scan pipeline

pub mod generators;
pub mod graph;
pub mod params;
pub mod policy;
pub mod scan;
pub mod selector;
pub mod services;

pub use generators::{EdgeGenerator, GeneratorContext, GeneratorOutput, GeneratorRegistry};
pub use graph::{Graph, GraphAssembler, GraphEdge, GraphNode, ScanManifest, ServiceNodeIndex};
pub use params::{resolve_parameters, ParameterResolverSpec, ParameterSource};
pub use policy::{PolicyEdgeResolver, ResourceResolver, RoleBinding, RoleRecord, RoleStore};
pub use scan::{ScanPipeline, ScanPlan, ScanSummary};
pub use selector::{Query, Selector, SelectorEngine};
pub use services::{NodeTranslator, ServiceCatalog, ServiceDescriptor};
