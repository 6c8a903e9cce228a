//! The API surface the query layer depends on.

use async_trait::async_trait;

use crate::error::SdkResult;
use crate::resources::stats::OverallStats;
use crate::resources::tasks::{Task, TaskFilters, TaskListItem};
use crate::TaskHuntClient;

/// Read-only task catalog operations.
///
/// Each call is one request with no local state. Arguments are owned so
/// callers can move them into futures that outlive the call site.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// `GET /api/tasks`
    async fn list_tasks(&self, filters: TaskFilters) -> SdkResult<Vec<TaskListItem>>;

    /// `GET /api/tasks/{benchmark}/{task_id}`
    async fn get_task(&self, benchmark: String, task_id: String) -> SdkResult<Task>;

    /// `GET /api/tasks/search`
    async fn search_tasks(&self, query: String, limit: u32) -> SdkResult<Vec<TaskListItem>>;

    /// `GET /api/stats`
    async fn get_stats(&self) -> SdkResult<OverallStats>;

    /// `GET /api/tasks/pr`
    async fn list_pr_tasks(&self, benchmark: Option<String>) -> SdkResult<Vec<TaskListItem>>;
}

#[async_trait]
impl TaskApi for TaskHuntClient {
    async fn list_tasks(&self, filters: TaskFilters) -> SdkResult<Vec<TaskListItem>> {
        self.tasks().list(&filters).await
    }

    async fn get_task(&self, benchmark: String, task_id: String) -> SdkResult<Task> {
        self.tasks().get(&benchmark, &task_id).await
    }

    async fn search_tasks(&self, query: String, limit: u32) -> SdkResult<Vec<TaskListItem>> {
        self.tasks().search(&query, limit).await
    }

    async fn get_stats(&self) -> SdkResult<OverallStats> {
        self.stats().get().await
    }

    async fn list_pr_tasks(&self, benchmark: Option<String>) -> SdkResult<Vec<TaskListItem>> {
        self.tasks().list_pr(benchmark.as_deref()).await
    }
}
