//! Shared traits used across Stratus crates.

pub mod state_store;

pub use state_store::StateStore;
