//! TaskHunt SDK
//!
//! This crate provides a Rust SDK for the TaskHunt task catalog API, a
//! read-only service that lists benchmark tasks, their details and
//! catalog statistics.
//!
//! # Features
//!
//! - **Type-safe API clients**: Strongly-typed task and stats models
//! - **Filter store**: Observable filter selections shared across consumers
//! - **Query layer**: Keyed result cache with in-flight de-duplication
//! - **Simple error taxonomy**: Transport failures versus non-2xx responses
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use taskhunt_sdk::{SdkConfig, TaskFilters, TaskHuntClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = TaskHuntClient::new(SdkConfig::new("https://taskhunt.example.com"))?;
//!
//!     let filters = TaskFilters::new().with_benchmark("tb-core").with_difficulty("easy");
//!     let tasks = client.tasks().list(&filters).await?;
//!     println!("Found {} tasks", tasks.len());
//!
//!     let task = client.tasks().get("tb-core", "hello-world").await?;
//!     println!("{}", task.instruction);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Query layer
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskhunt_sdk::{FilterStore, SdkConfig, TaskHuntClient, TaskQueries};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(TaskHuntClient::new(SdkConfig::from_env())?);
//! let queries = TaskQueries::new(client, FilterStore::new());
//!
//! queries.filters().set_benchmark(Some("tb-core".to_string()));
//! let result = queries.tasks(None).await;
//! if let Some(tasks) = result.data() {
//!     println!("{} task(s) found", tasks.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! ```rust,no_run
//! use taskhunt_sdk::{SdkError, TaskHuntClient};
//!
//! async fn handle_errors(client: &TaskHuntClient) {
//!     match client.tasks().get("tb-core", "missing").await {
//!         Ok(task) => println!("Got {}", task.id),
//!         Err(e) if e.is_not_found() => eprintln!("No such task"),
//!         Err(SdkError::NetworkError(e)) => eprintln!("Unreachable: {}", e),
//!         Err(e) => eprintln!("Other error: {}", e),
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod filters;
pub mod query;
pub mod resources;

// Re-export main types for convenience
pub use api::TaskApi;
pub use client::HttpClient;
pub use config::{SdkConfig, SdkConfigBuilder, API_URL_ENV, DEFAULT_API_URL};
pub use error::{SdkError, SdkResult};
pub use filters::{FilterState, FilterStore};
pub use query::{
    CacheEntry, FetchStatus, QueryCache, QueryKey, QueryObserver, QueryResult, QueryStatus,
    TaskQueries, MIN_SEARCH_LEN,
};

// Re-export resource clients
pub use resources::stats::{
    BenchmarkOption, BenchmarkStats, FilterOptions, OverallStats, StatsClient,
};
pub use resources::tasks::{
    Difficulty, EnvironmentConfig, PrInfo, Task, TaskFilters, TaskListItem, TaskMetadata,
    TasksClient, DEFAULT_SEARCH_LIMIT,
};

use std::sync::Arc;

/// The main client for the TaskHunt API.
///
/// This client provides access to all API resources through dedicated
/// sub-clients. It is cheap to clone; clones share one connection pool.
///
/// # Example
///
/// ```rust,no_run
/// use taskhunt_sdk::{SdkConfig, TaskHuntClient};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = TaskHuntClient::new(SdkConfig::new("https://api.example.com"))?;
///
/// let tasks = client.tasks();
/// let stats = client.stats();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TaskHuntClient {
    http_client: Arc<HttpClient>,
    tasks: TasksClient,
    stats: StatsClient,
}

impl TaskHuntClient {
    /// Create a new client with the given configuration.
    ///
    /// Fails if the configuration is invalid.
    pub fn new(config: SdkConfig) -> SdkResult<Self> {
        let http_client = Arc::new(HttpClient::new(config)?);

        Ok(Self {
            tasks: TasksClient::new(Arc::clone(&http_client)),
            stats: StatsClient::new(Arc::clone(&http_client)),
            http_client,
        })
    }

    /// Create a new client using a builder pattern.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use taskhunt_sdk::TaskHuntClient;
    /// use std::time::Duration;
    ///
    /// let client = TaskHuntClient::builder("https://api.example.com")
    ///     .with_timeout(Duration::from_secs(30))
    ///     .build()?;
    /// # Ok::<(), taskhunt_sdk::SdkError>(())
    /// ```
    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// Get the tasks client.
    pub fn tasks(&self) -> &TasksClient {
        &self.tasks
    }

    /// Get the stats client.
    pub fn stats(&self) -> &StatsClient {
        &self.stats
    }

    /// Get a reference to the underlying HTTP client.
    pub fn http_client(&self) -> &HttpClient {
        &self.http_client
    }

    /// Get the base URL of the API.
    pub fn base_url(&self) -> &str {
        &self.http_client.config().base_url
    }
}

/// Builder for creating a TaskHuntClient with fluent configuration.
#[derive(Debug)]
pub struct ClientBuilder {
    config_builder: SdkConfigBuilder,
}

impl ClientBuilder {
    /// Create a new client builder with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config_builder: SdkConfig::builder(base_url),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config_builder = self.config_builder.with_timeout(timeout);
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config_builder = self.config_builder.with_connect_timeout(timeout);
        self
    }

    /// Enable or disable request/response logging.
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.config_builder = self.config_builder.with_logging(enable);
        self
    }

    /// Add a custom header to all requests.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.with_header(name, value);
        self
    }

    /// Build the client.
    pub fn build(self) -> SdkResult<TaskHuntClient> {
        TaskHuntClient::new(self.config_builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = TaskHuntClient::builder("https://api.example.com")
            .with_timeout(std::time::Duration::from_secs(30))
            .with_logging(true)
            .build()
            .unwrap();

        assert_eq!(client.base_url(), "https://api.example.com");
        assert!(client.http_client().config().enable_logging);
    }

    #[test]
    fn test_client_rejects_bad_url() {
        assert!(TaskHuntClient::new(SdkConfig::new("::not a url::")).is_err());
    }
}
