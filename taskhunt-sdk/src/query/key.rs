//! Cache keys for the query layer.

use serde::Serialize;
use std::fmt;

use crate::resources::tasks::TaskFilters;

/// Deterministic identity of a logical request.
///
/// Two requests with equal keys are the same request: they share one
/// cache entry and at most one network call in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryKey {
    /// Filtered task listing
    Tasks {
        /// Normalized filters
        filters: TaskFilters,
    },
    /// One task's detail
    Task {
        /// Benchmark the task belongs to
        benchmark: String,
        /// Task identifier within the benchmark
        task_id: String,
    },
    /// Free-text search
    Search {
        /// Search text as typed
        query: String,
    },
    /// Catalog statistics
    Stats,
    /// PR-sourced task listing
    PrTasks {
        /// Benchmark to restrict to
        benchmark: Option<String>,
    },
}

impl QueryKey {
    /// Key for a task listing. Filters are normalized first so that
    /// filter sets producing the same request share a key.
    pub fn tasks(filters: &TaskFilters) -> Self {
        QueryKey::Tasks {
            filters: filters.normalized(),
        }
    }

    /// Key for one task's detail
    pub fn task(benchmark: impl Into<String>, task_id: impl Into<String>) -> Self {
        QueryKey::Task {
            benchmark: benchmark.into(),
            task_id: task_id.into(),
        }
    }

    /// Key for a search. The query is kept verbatim.
    pub fn search(query: impl Into<String>) -> Self {
        QueryKey::Search {
            query: query.into(),
        }
    }

    /// Key for the PR task listing. An empty benchmark counts as none.
    pub fn pr_tasks(benchmark: Option<&str>) -> Self {
        QueryKey::PrTasks {
            benchmark: benchmark.filter(|b| !b.is_empty()).map(str::to_string),
        }
    }

    /// Short name of the endpoint kind
    pub fn kind(&self) -> &'static str {
        match self {
            QueryKey::Tasks { .. } => "tasks",
            QueryKey::Task { .. } => "task",
            QueryKey::Search { .. } => "search",
            QueryKey::Stats => "stats",
            QueryKey::PrTasks { .. } => "pr_tasks",
        }
    }

    /// Stable JSON encoding of the key
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.kind().to_string())
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_equivalent_filters_share_a_key() {
        let a = TaskFilters::new().with_benchmark("tb-core").with_search("");
        let b = TaskFilters::new().with_benchmark("tb-core").with_limit(0);
        assert_eq!(QueryKey::tasks(&a), QueryKey::tasks(&b));

        let c = TaskFilters::new().with_benchmark("tb-core").with_include_prs(true);
        assert_ne!(QueryKey::tasks(&a), QueryKey::tasks(&c));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let key = QueryKey::tasks(
            &TaskFilters::new()
                .with_difficulty("easy")
                .with_benchmark("tb-core"),
        );
        assert_eq!(
            key.encode(),
            r#"{"kind":"tasks","filters":{"benchmark":"tb-core","difficulty":"easy"}}"#
        );
        assert_eq!(key.to_string(), key.encode());

        assert_eq!(QueryKey::Stats.encode(), r#"{"kind":"stats"}"#);
        assert_eq!(
            QueryKey::task("bench", "t1").encode(),
            r#"{"kind":"task","benchmark":"bench","task_id":"t1"}"#
        );
    }

    #[test]
    fn test_pr_tasks_ignores_empty_benchmark() {
        assert_eq!(QueryKey::pr_tasks(Some("")), QueryKey::pr_tasks(None));
        assert_eq!(QueryKey::pr_tasks(Some("tb-core")).kind(), "pr_tasks");
    }
}
