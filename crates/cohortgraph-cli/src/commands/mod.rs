//! CLI command implementations.

pub mod build;
pub mod prune;
pub mod release;
