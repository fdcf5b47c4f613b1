//! # stratus-storage
//!
//! State store backends. `MemoryStateStore` is the reference implementation:
//! concurrent, append-only per key, with deterministic global reads.

pub mod memory;

pub use memory::MemoryStateStore;
