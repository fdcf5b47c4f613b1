//! Service descriptors: the declarative per-service behavior table.
//!
//! - `loader.rs`: compiles raw `[[services]]` TOML tables, parsing every selector
//! - `catalog.rs`: `ServiceCatalog`, indexed by key and by ARN service segment
//! - `translator.rs`: `NodeTranslator` for projecting raw items into nodes
//! - `builtin/`: embedded descriptors for common AWS services

pub mod catalog;
pub mod loader;
pub mod translator;

pub use catalog::ServiceCatalog;
pub use loader::{EdgeDescriptor, OperationDescriptor, ServiceDescriptor};
pub use translator::{DefaultTranslator, NodeItem, NodeTranslator, TranslatorSet};
