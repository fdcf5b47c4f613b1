//! Role/policy edge inference.
//!
//! - `document.rs`: statement decoding (JSON or URL-encoded documents)
//! - `role.rs`: `RoleRecord`, `RoleStore`, `RoleBinding`
//! - `resolver.rs`: resource glob resolution and `edges_for_role`

pub mod document;
pub mod resolver;
pub mod role;

pub use document::{decode_statements, Statement};
pub use resolver::{PolicyEdgeResolver, ResourceResolver};
pub use role::{Policy, RoleBinding, RoleRecord, RoleStore};
