//! Shared data types.

pub mod collections;
pub mod scan;
