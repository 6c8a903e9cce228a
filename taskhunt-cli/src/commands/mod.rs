//! CLI command implementations

pub mod config;
pub mod stats;
pub mod tasks;
