//! Stats resource client
//!
//! Aggregate counts across benchmarks, plus the known difficulty and
//! category labels used to populate filter option lists.

use crate::client::HttpClient;
use crate::error::SdkResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Client for catalog statistics
#[derive(Debug, Clone)]
pub struct StatsClient {
    client: Arc<HttpClient>,
}

impl StatsClient {
    /// Create a new stats client
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Get overall catalog statistics
    pub async fn get(&self) -> SdkResult<OverallStats> {
        self.client.get("/api/stats").await
    }
}

/// Catalog-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    /// Tasks across all benchmarks
    pub total_tasks: u64,
    /// Tasks sourced from pull requests
    pub total_pr_tasks: u64,
    /// Per-benchmark breakdown
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkStats>,
    /// Distinct difficulty labels
    #[serde(default)]
    pub difficulties: Vec<String>,
    /// Distinct category labels
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Per-benchmark statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkStats {
    /// Benchmark identifier
    pub benchmark: String,
    /// Human-readable benchmark name
    pub display_name: String,
    /// Tasks in this benchmark
    pub total_tasks: u64,
    /// Task count per difficulty
    #[serde(default)]
    pub by_difficulty: BTreeMap<String, u64>,
    /// Task count per category
    #[serde(default)]
    pub by_category: BTreeMap<String, u64>,
}

/// A selectable benchmark in the filter controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchmarkOption {
    /// Value sent as the `benchmark` filter
    pub benchmark: String,
    /// Label shown for the option
    pub display_name: String,
    /// Tasks in the benchmark
    pub total_tasks: u64,
}

/// Option lists for the benchmark, difficulty and category filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Benchmarks to choose from
    pub benchmarks: Vec<BenchmarkOption>,
    /// Difficulties to choose from
    pub difficulties: Vec<String>,
    /// Categories to choose from
    pub categories: Vec<String>,
}

impl FilterOptions {
    /// Derive option lists from stats. Without stats (still loading, or
    /// the stats request failed) every list is empty.
    pub fn from_stats(stats: Option<&OverallStats>) -> Self {
        let Some(stats) = stats else {
            return Self::default();
        };

        Self {
            benchmarks: stats
                .benchmarks
                .iter()
                .map(|b| BenchmarkOption {
                    benchmark: b.benchmark.clone(),
                    display_name: b.display_name.clone(),
                    total_tasks: b.total_tasks,
                })
                .collect(),
            difficulties: stats.difficulties.clone(),
            categories: stats.categories.clone(),
        }
    }

    /// True when no option is available in any list
    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty() && self.difficulties.is_empty() && self.categories.is_empty()
    }
}
