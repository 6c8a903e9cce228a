//! Query layer
//!
//! Bridges the [`FilterStore`] and a [`TaskApi`] with caching and request
//! de-duplication. Every operation derives a [`QueryKey`] from its inputs
//! and goes through a per-endpoint [`QueryCache`]:
//!
//! ```text
//! filter change -> key -> cached?  yes -> entry
//!                          in flight? -> join it
//!                          otherwise  -> one API call -> entry
//! ```
//!
//! Task detail and search are inert until their inputs are usable: a
//! detail lookup needs both benchmark and task ID, a search needs at
//! least [`MIN_SEARCH_LEN`] characters.

pub mod cache;
pub mod key;
pub mod observer;

pub use cache::{CacheEntry, QueryCache, QueryStatus};
pub use key::QueryKey;
pub use observer::{FetchStatus, QueryObserver, QueryResult};

use std::sync::Arc;

use crate::api::TaskApi;
use crate::filters::FilterStore;
use crate::resources::stats::OverallStats;
use crate::resources::tasks::{Task, TaskFilters, TaskListItem, DEFAULT_SEARCH_LIMIT};

/// Shortest search text that issues a request
pub const MIN_SEARCH_LEN: usize = 2;

/// Cached, de-duplicated access to the task catalog.
pub struct TaskQueries<A> {
    api: Arc<A>,
    filters: FilterStore,
    tasks: QueryCache<Vec<TaskListItem>>,
    task: QueryCache<Task>,
    search: QueryCache<Vec<TaskListItem>>,
    stats: QueryCache<OverallStats>,
    pr_tasks: QueryCache<Vec<TaskListItem>>,
}

impl<A: TaskApi + 'static> TaskQueries<A> {
    /// Create a query layer reading filter selections from `filters`
    pub fn new(api: Arc<A>, filters: FilterStore) -> Self {
        Self {
            api,
            filters,
            tasks: QueryCache::new(),
            task: QueryCache::new(),
            search: QueryCache::new(),
            stats: QueryCache::new(),
            pr_tasks: QueryCache::new(),
        }
    }

    /// The filter store this layer reads from
    pub fn filters(&self) -> &FilterStore {
        &self.filters
    }

    /// Filters a task listing would use right now: the store's
    /// selections overlaid with `extra`.
    pub fn merged_filters(&self, extra: Option<&TaskFilters>) -> TaskFilters {
        let base = self.filters.snapshot().to_filters();
        match extra {
            Some(extra) => base.merge(extra),
            None => base,
        }
    }

    /// Key a task listing would use right now
    pub fn tasks_key(&self, extra: Option<&TaskFilters>) -> QueryKey {
        QueryKey::tasks(&self.merged_filters(extra))
    }

    /// Task listing for the current filters, merged with `extra`
    pub async fn tasks(&self, extra: Option<&TaskFilters>) -> QueryResult<Vec<TaskListItem>> {
        let filters = self.merged_filters(extra).normalized();
        let key = QueryKey::tasks(&filters);
        let api = Arc::clone(&self.api);
        self.tasks
            .fetch(&key, move || async move { api.list_tasks(filters).await })
            .await
            .into()
    }

    /// Re-issue the task listing for the current filters
    pub async fn refresh_tasks(&self, extra: Option<&TaskFilters>) -> QueryResult<Vec<TaskListItem>> {
        let filters = self.merged_filters(extra).normalized();
        let key = QueryKey::tasks(&filters);
        let api = Arc::clone(&self.api);
        self.tasks
            .refetch(&key, move || async move { api.list_tasks(filters).await })
            .await
            .into()
    }

    /// Non-blocking view of the task listing for the current filters,
    /// through `observer` so earlier data stays visible while a new key
    /// loads.
    pub fn observe_tasks(
        &self,
        observer: &mut QueryObserver<Vec<TaskListItem>>,
        extra: Option<&TaskFilters>,
    ) -> QueryResult<Vec<TaskListItem>> {
        let key = self.tasks_key(extra);
        observer.observe(&key, self.tasks.peek(&key))
    }

    /// One task's detail; inert until both parts are present
    pub async fn task(&self, benchmark: Option<&str>, task_id: Option<&str>) -> QueryResult<Task> {
        let Some((benchmark, task_id)) = detail_params(benchmark, task_id) else {
            return QueryResult::disabled();
        };
        let key = QueryKey::task(benchmark.clone(), task_id.clone());
        let api = Arc::clone(&self.api);
        self.task
            .fetch(&key, move || async move { api.get_task(benchmark, task_id).await })
            .await
            .into()
    }

    /// Re-issue a task detail lookup
    pub async fn refresh_task(&self, benchmark: Option<&str>, task_id: Option<&str>) -> QueryResult<Task> {
        let Some((benchmark, task_id)) = detail_params(benchmark, task_id) else {
            return QueryResult::disabled();
        };
        let key = QueryKey::task(benchmark.clone(), task_id.clone());
        let api = Arc::clone(&self.api);
        self.task
            .refetch(&key, move || async move { api.get_task(benchmark, task_id).await })
            .await
            .into()
    }

    /// Free-text search; inert below [`MIN_SEARCH_LEN`] characters
    pub async fn search(&self, query: &str) -> QueryResult<Vec<TaskListItem>> {
        if query.chars().count() < MIN_SEARCH_LEN {
            return QueryResult::disabled();
        }
        let key = QueryKey::search(query);
        let api = Arc::clone(&self.api);
        let query = query.to_string();
        self.search
            .fetch(&key, move || async move {
                api.search_tasks(query, DEFAULT_SEARCH_LIMIT).await
            })
            .await
            .into()
    }

    /// Catalog statistics
    pub async fn stats(&self) -> QueryResult<OverallStats> {
        let api = Arc::clone(&self.api);
        self.stats
            .fetch(&QueryKey::Stats, move || async move { api.get_stats().await })
            .await
            .into()
    }

    /// Re-issue the statistics request
    pub async fn refresh_stats(&self) -> QueryResult<OverallStats> {
        let api = Arc::clone(&self.api);
        self.stats
            .refetch(&QueryKey::Stats, move || async move { api.get_stats().await })
            .await
            .into()
    }

    /// Tasks sourced from pull requests, optionally for one benchmark
    pub async fn pr_tasks(&self, benchmark: Option<&str>) -> QueryResult<Vec<TaskListItem>> {
        let key = QueryKey::pr_tasks(benchmark);
        let benchmark = benchmark.filter(|b| !b.is_empty()).map(str::to_string);
        let api = Arc::clone(&self.api);
        self.pr_tasks
            .fetch(&key, move || async move { api.list_pr_tasks(benchmark).await })
            .await
            .into()
    }

    /// Drop every cached result
    pub fn invalidate_all(&self) {
        self.tasks.clear();
        self.task.clear();
        self.search.clear();
        self.stats.clear();
        self.pr_tasks.clear();
    }
}

fn detail_params(benchmark: Option<&str>, task_id: Option<&str>) -> Option<(String, String)> {
    match (benchmark, task_id) {
        (Some(b), Some(t)) if !b.is_empty() && !t.is_empty() => Some((b.to_string(), t.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockTaskApi;
    use crate::error::SdkError;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn item(id: &str) -> TaskListItem {
        TaskListItem {
            id: id.to_string(),
            benchmark: "tb-core".to_string(),
            benchmark_display_name: "Terminal Bench Core".to_string(),
            instruction_preview: "Do the thing".to_string(),
            difficulty: Some("easy".to_string()),
            category: None,
            tags: vec![],
            author_name: None,
            is_from_pr: false,
            pr_number: None,
        }
    }

    fn queries(api: MockTaskApi) -> TaskQueries<MockTaskApi> {
        TaskQueries::new(Arc::new(api), FilterStore::new())
    }

    #[tokio::test]
    async fn test_tasks_uses_store_and_caches() {
        let mut api = MockTaskApi::new();
        api.expect_list_tasks()
            .with(eq(TaskFilters::new()
                .with_benchmark("tb-core")
                .with_difficulty("easy")
                .with_include_prs(true)))
            .times(1)
            .returning(|_| Ok(vec![item("t1")]));

        let queries = queries(api);
        queries.filters().set_benchmark(Some("tb-core".to_string()));
        queries.filters().set_difficulty(Some("easy".to_string()));

        let first = queries.tasks(None).await;
        assert!(first.is_success());
        assert_eq!(first.data().map(Vec::len), Some(1));

        let second = queries.tasks(None).await;
        assert_eq!(second.data().unwrap()[0].id, "t1");
    }

    #[tokio::test]
    async fn test_concurrent_identical_tasks_issue_one_call() {
        let mut api = MockTaskApi::new();
        api.expect_list_tasks()
            .times(1)
            .returning(|_| Ok(vec![item("t1"), item("t2")]));

        let queries = queries(api);
        let (a, b) = tokio::join!(queries.tasks(None), queries.tasks(None));
        assert_eq!(a.data().map(Vec::len), Some(2));
        assert_eq!(b.data().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_filter_change_changes_key() {
        let mut api = MockTaskApi::new();
        api.expect_list_tasks().times(2).returning(|_| Ok(vec![]));

        let queries = queries(api);
        let before = queries.tasks_key(None);
        queries.tasks(None).await;

        queries.filters().set_category(Some("security".to_string()));
        assert_ne!(queries.tasks_key(None), before);
        queries.tasks(None).await;
    }

    #[tokio::test]
    async fn test_extra_filters_override_store() {
        let mut api = MockTaskApi::new();
        api.expect_list_tasks()
            .with(eq(TaskFilters::new()
                .with_benchmark("tb-2")
                .with_include_prs(false)
                .with_limit(10)))
            .times(1)
            .returning(|_| Ok(vec![]));

        let queries = queries(api);
        queries.filters().set_benchmark(Some("tb-core".to_string()));

        let extra = TaskFilters::new()
            .with_benchmark("tb-2")
            .with_include_prs(false)
            .with_limit(10);
        assert!(queries.tasks(Some(&extra)).await.is_success());
    }

    #[tokio::test]
    async fn test_task_is_inert_without_both_parts() {
        let mut api = MockTaskApi::new();
        api.expect_get_task().never();
        let queries = queries(api);

        assert!(queries.task(None, Some("t1")).await.is_disabled());
        assert!(queries.task(Some("bench"), None).await.is_disabled());
        assert!(queries.task(Some(""), Some("t1")).await.is_disabled());
    }

    #[tokio::test]
    async fn test_task_not_found_is_an_api_error() {
        let mut api = MockTaskApi::new();
        api.expect_get_task()
            .with(eq("bench".to_string()), eq("missing".to_string()))
            .times(1)
            .returning(|_, _| Err(SdkError::from_response(404, "")));

        let queries = queries(api);
        let result = queries.task(Some("bench"), Some("missing")).await;
        assert!(result.is_error());
        assert!(result.error.unwrap().is_not_found());
    }

    #[tokio::test]
    async fn test_search_requires_two_characters() {
        let mut api = MockTaskApi::new();
        api.expect_search_tasks()
            .with(eq("ab".to_string()), eq(DEFAULT_SEARCH_LIMIT))
            .times(1)
            .returning(|_, _| Ok(vec![item("t1")]));

        let queries = queries(api);
        assert!(queries.search("a").await.is_disabled());
        assert!(queries.search("").await.is_disabled());
        assert!(queries.search("ab").await.is_success());
    }

    #[tokio::test]
    async fn test_stats_error_then_refresh() {
        let mut api = MockTaskApi::new();
        let mut seq = mockall::Sequence::new();
        api.expect_get_stats()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(SdkError::from_response(500, "")));
        api.expect_get_stats()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(OverallStats::default()));

        let queries = queries(api);
        let failed = queries.stats().await;
        assert_eq!(failed.error.as_ref().and_then(|e| e.status_code()), Some(500));

        // Settled errors are served from cache until refreshed.
        assert!(queries.stats().await.is_error());
        assert!(queries.refresh_stats().await.is_success());
    }

    #[tokio::test]
    async fn test_pr_tasks_and_invalidate_all() {
        let mut api = MockTaskApi::new();
        api.expect_list_pr_tasks()
            .with(eq(Some("tb-core".to_string())))
            .times(2)
            .returning(|_| Ok(vec![item("pr-1")]));

        let queries = queries(api);
        assert!(queries.pr_tasks(Some("tb-core")).await.is_success());
        assert!(queries.pr_tasks(Some("tb-core")).await.is_success());

        queries.invalidate_all();
        assert!(queries.pr_tasks(Some("tb-core")).await.is_success());
    }

    #[tokio::test]
    async fn test_observe_tasks_before_and_after_fetch() {
        let mut api = MockTaskApi::new();
        api.expect_list_tasks().returning(|_| Ok(vec![item("t1")]));

        let queries = queries(api);
        let mut observer = QueryObserver::new();

        let before = queries.observe_tasks(&mut observer, None);
        assert_eq!(before.status, QueryStatus::Pending);
        assert!(before.data.is_none());

        queries.tasks(None).await;
        let after = queries.observe_tasks(&mut observer, None);
        assert!(after.is_success());

        queries.filters().set_search("nginx");
        let switching = queries.observe_tasks(&mut observer, None);
        assert!(switching.is_placeholder);
        assert_eq!(switching.data().map(Vec::len), Some(1));
    }
}
