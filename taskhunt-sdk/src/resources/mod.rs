//! SDK resource modules
//!
//! This module contains resource-specific clients for interacting with
//! different API endpoints.

pub mod stats;
pub mod tasks;

pub use stats::StatsClient;
pub use tasks::TasksClient;
