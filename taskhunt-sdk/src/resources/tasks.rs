//! Tasks resource client
//!
//! This module provides the read-only task endpoints: listing with
//! filters, detail lookup, free-text search and the PR task listing.

use crate::client::HttpClient;
use crate::error::SdkResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default page size for search requests
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;

/// Client for task operations
#[derive(Debug, Clone)]
pub struct TasksClient {
    client: Arc<HttpClient>,
}

impl TasksClient {
    /// Create a new tasks client
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// List tasks matching the given filters.
    ///
    /// Only the filters that are set end up in the query string.
    pub async fn list(&self, filters: &TaskFilters) -> SdkResult<Vec<TaskListItem>> {
        self.client
            .get_with_query("/api/tasks", &filters.normalized())
            .await
    }

    /// Get a single task by benchmark and task ID
    pub async fn get(&self, benchmark: &str, task_id: &str) -> SdkResult<Task> {
        self.client.get(&task_path(benchmark, task_id)).await
    }

    /// Search tasks by free text
    pub async fn search(&self, query: &str, limit: u32) -> SdkResult<Vec<TaskListItem>> {
        self.client
            .get_with_query("/api/tasks/search", &SearchParams { q: query, limit })
            .await
    }

    /// List tasks contributed through pull requests
    pub async fn list_pr(&self, benchmark: Option<&str>) -> SdkResult<Vec<TaskListItem>> {
        let params = PrTaskParams {
            benchmark: benchmark.filter(|b| !b.is_empty()),
        };
        self.client.get_with_query("/api/tasks/pr", &params).await
    }
}

/// Path of a task detail resource, with both segments percent-encoded
pub fn task_path(benchmark: &str, task_id: &str) -> String {
    format!(
        "/api/tasks/{}/{}",
        urlencoding::encode(benchmark),
        urlencoding::encode(task_id)
    )
}

#[derive(Debug, Serialize)]
struct SearchParams<'a> {
    q: &'a str,
    limit: u32,
}

#[derive(Debug, Serialize)]
struct PrTaskParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    benchmark: Option<&'a str>,
}

/// Filters accepted by the task listing endpoint.
///
/// Field order is the order parameters appear in the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskFilters {
    /// Restrict to one benchmark
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<String>,
    /// Restrict to one difficulty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    /// Restrict to one category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Free-text match on the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Include PR-sourced tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_prs: Option<bool>,
    /// Maximum number of tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Number of tasks to skip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl TaskFilters {
    /// Empty filter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the benchmark
    pub fn with_benchmark(mut self, benchmark: impl Into<String>) -> Self {
        self.benchmark = Some(benchmark.into());
        self
    }

    /// Set the difficulty
    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = Some(difficulty.into());
        self
    }

    /// Set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the search text
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Set whether PR tasks are included
    pub fn with_include_prs(mut self, include_prs: bool) -> Self {
        self.include_prs = Some(include_prs);
        self
    }

    /// Set the page size
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the page offset
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Drop values that would not be sent: empty strings and zero
    /// limit/offset become unset. `include_prs` is kept whenever set.
    pub fn normalized(&self) -> Self {
        fn text(value: &Option<String>) -> Option<String> {
            value.as_ref().filter(|v| !v.is_empty()).cloned()
        }
        fn count(value: Option<u32>) -> Option<u32> {
            value.filter(|v| *v != 0)
        }

        Self {
            benchmark: text(&self.benchmark),
            difficulty: text(&self.difficulty),
            category: text(&self.category),
            search: text(&self.search),
            include_prs: self.include_prs,
            limit: count(self.limit),
            offset: count(self.offset),
        }
    }

    /// Overlay `overrides` on top of `self`; every field set in
    /// `overrides` wins.
    pub fn merge(&self, overrides: &TaskFilters) -> Self {
        Self {
            benchmark: overrides.benchmark.clone().or_else(|| self.benchmark.clone()),
            difficulty: overrides.difficulty.clone().or_else(|| self.difficulty.clone()),
            category: overrides.category.clone().or_else(|| self.category.clone()),
            search: overrides.search.clone().or_else(|| self.search.clone()),
            include_prs: overrides.include_prs.or(self.include_prs),
            limit: overrides.limit.or(self.limit),
            offset: overrides.offset.or(self.offset),
        }
    }
}

/// Reduced projection of a task used for list rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskListItem {
    /// Task identifier within its benchmark
    pub id: String,
    /// Benchmark identifier
    pub benchmark: String,
    /// Human-readable benchmark name
    pub benchmark_display_name: String,
    /// Leading part of the instruction
    pub instruction_preview: String,
    /// Difficulty label
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Category label
    #[serde(default)]
    pub category: Option<String>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Task author
    #[serde(default)]
    pub author_name: Option<String>,
    /// Sourced from an open or merged pull request
    #[serde(default)]
    pub is_from_pr: bool,
    /// Pull request number when `is_from_pr`
    #[serde(default)]
    pub pr_number: Option<u64>,
}

/// A single benchmark task with full instruction and provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier within its benchmark
    pub id: String,
    /// Benchmark identifier
    pub benchmark: String,
    /// Human-readable benchmark name
    pub benchmark_display_name: String,
    /// Full task instruction
    pub instruction: String,
    /// Authoring and classification metadata
    pub metadata: TaskMetadata,
    /// Container environment
    #[serde(default)]
    pub environment: Option<EnvironmentConfig>,
    /// Time the agent is allowed, in seconds
    #[serde(default)]
    pub agent_timeout_sec: Option<f64>,
    /// Time the verifier is allowed, in seconds
    #[serde(default)]
    pub verifier_timeout_sec: Option<f64>,
    /// Source location on GitHub
    #[serde(default)]
    pub github_url: Option<String>,
    /// Pull request the task came from
    #[serde(default)]
    pub pr_info: Option<PrInfo>,
}

/// Authoring and classification metadata of a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskMetadata {
    /// Author name
    #[serde(default)]
    pub author_name: Option<String>,
    /// Author email
    #[serde(default)]
    pub author_email: Option<String>,
    /// Difficulty label
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Category label
    #[serde(default)]
    pub category: Option<String>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Expected minutes for an expert
    #[serde(default)]
    pub expert_time_estimate_min: Option<f64>,
    /// Expected minutes for a junior engineer
    #[serde(default)]
    pub junior_time_estimate_min: Option<f64>,
}

impl TaskMetadata {
    /// True when at least one time estimate is present
    pub fn has_time_estimates(&self) -> bool {
        self.expert_time_estimate_min.is_some() || self.junior_time_estimate_min.is_some()
    }
}

/// Container environment a task runs in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Base image
    #[serde(default)]
    pub docker_image: Option<String>,
    /// CPU allocation
    #[serde(default)]
    pub cpus: Option<f64>,
    /// Memory limit, e.g. `4G`
    #[serde(default)]
    pub memory: Option<String>,
    /// Storage limit
    #[serde(default)]
    pub storage: Option<String>,
    /// Image build timeout in seconds
    #[serde(default)]
    pub build_timeout_sec: Option<f64>,
}

/// Pull request a community task was sourced from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrInfo {
    /// Pull request number
    pub number: u64,
    /// Pull request title
    pub title: String,
    /// Link to the pull request
    pub url: String,
    /// GitHub login of the author
    pub author: String,
    /// State as reported by GitHub, e.g. `open` or `merged`
    pub state: String,
    /// Creation time as sent by the server
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last update time as sent by the server
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl PrInfo {
    /// Creation time, when present and RFC 3339
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.created_at.as_deref())
    }

    /// Last update time, when present and RFC 3339
    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.updated_at.as_deref())
    }
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value?)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Difficulty bucket used for badge styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    /// `easy`
    Easy,
    /// `medium`
    Medium,
    /// `hard`
    Hard,
    /// Missing or unrecognised label
    Other,
}

impl Difficulty {
    /// Classify a free-form difficulty label, case-insensitively
    pub fn classify(label: Option<&str>) -> Self {
        match label.map(str::to_lowercase).as_deref() {
            Some("easy") => Difficulty::Easy,
            Some("medium") => Difficulty::Medium,
            Some("hard") => Difficulty::Hard,
            _ => Difficulty::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalized_drops_empty_values() {
        let filters = TaskFilters {
            benchmark: Some(String::new()),
            difficulty: Some("easy".to_string()),
            search: Some(String::new()),
            include_prs: Some(false),
            limit: Some(0),
            offset: Some(20),
            ..Default::default()
        };

        assert_eq!(
            filters.normalized(),
            TaskFilters::new()
                .with_difficulty("easy")
                .with_include_prs(false)
                .with_offset(20)
        );
    }

    #[test]
    fn test_merge_overrides_win() {
        let base = TaskFilters::new()
            .with_benchmark("tb-core")
            .with_difficulty("easy")
            .with_include_prs(true);
        let overrides = TaskFilters::new().with_difficulty("hard").with_limit(10);

        let merged = base.merge(&overrides);
        assert_eq!(merged.benchmark.as_deref(), Some("tb-core"));
        assert_eq!(merged.difficulty.as_deref(), Some("hard"));
        assert_eq!(merged.include_prs, Some(true));
        assert_eq!(merged.limit, Some(10));
        assert_eq!(merged.offset, None);
    }

    #[test]
    fn test_task_path_encodes_segments() {
        assert_eq!(task_path("bench", "t1"), "/api/tasks/bench/t1");
        assert_eq!(task_path("tb core", "a/b"), "/api/tasks/tb%20core/a%2Fb");
    }

    #[test]
    fn test_task_decodes_with_missing_optionals() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "id": "hello-world",
            "benchmark": "tb-core",
            "benchmark_display_name": "Terminal Bench Core",
            "instruction": "Print hello world",
            "metadata": { "difficulty": "easy", "tags": ["shell"] }
        }))
        .unwrap();

        assert_eq!(task.metadata.difficulty.as_deref(), Some("easy"));
        assert_eq!(task.metadata.tags, vec!["shell".to_string()]);
        assert!(task.environment.is_none());
        assert!(task.pr_info.is_none());
        assert!(!task.metadata.has_time_estimates());
    }

    #[test]
    fn test_pr_info_timestamps() {
        let pr = PrInfo {
            number: 42,
            title: "Add task".to_string(),
            url: "https://github.com/org/repo/pull/42".to_string(),
            author: "octocat".to_string(),
            state: "open".to_string(),
            created_at: Some("2025-03-01T10:00:00Z".to_string()),
            updated_at: Some("yesterday".to_string()),
        };

        assert!(pr.created_at_utc().is_some());
        assert!(pr.updated_at_utc().is_none());
    }

    #[test]
    fn test_difficulty_classification() {
        assert_eq!(Difficulty::classify(Some("Easy")), Difficulty::Easy);
        assert_eq!(Difficulty::classify(Some("MEDIUM")), Difficulty::Medium);
        assert_eq!(Difficulty::classify(Some("hard")), Difficulty::Hard);
        assert_eq!(Difficulty::classify(Some("insane")), Difficulty::Other);
        assert_eq!(Difficulty::classify(None), Difficulty::Other);
    }
}
