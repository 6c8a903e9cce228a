//! What a consumer sees of a query.

use std::sync::Arc;

use crate::error::SdkError;
use crate::query::cache::{CacheEntry, QueryStatus};
use crate::query::key::QueryKey;

/// Whether a request is currently running for the query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// A request is in flight
    Fetching,
    /// No request is running
    Idle,
}

/// Status, data and error of one query as seen by a consumer.
#[derive(Debug)]
pub struct QueryResult<T> {
    /// `None` for a disabled query
    pub key: Option<QueryKey>,
    /// Outcome of the last applied response for `key`
    pub status: QueryStatus,
    /// Whether a request is running right now
    pub fetch_status: FetchStatus,
    /// Value to render, possibly a placeholder
    pub data: Option<Arc<T>>,
    /// Failure of the last applied response
    pub error: Option<Arc<SdkError>>,
    /// `data` belongs to a previous key and is shown while this one loads
    pub is_placeholder: bool,
}

impl<T> Clone for QueryResult<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            status: self.status,
            fetch_status: self.fetch_status,
            data: self.data.clone(),
            error: self.error.clone(),
            is_placeholder: self.is_placeholder,
        }
    }
}

impl<T> QueryResult<T> {
    /// A query that is not allowed to run yet
    pub fn disabled() -> Self {
        Self {
            key: None,
            status: QueryStatus::Pending,
            fetch_status: FetchStatus::Idle,
            data: None,
            error: None,
            is_placeholder: false,
        }
    }

    /// Enabled, no response applied yet and nothing to show. Holds
    /// before the first request starts as well as while it runs.
    pub fn is_loading(&self) -> bool {
        self.key.is_some() && self.status == QueryStatus::Pending && self.data.is_none()
    }

    /// Last applied response succeeded
    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    /// Last applied response failed
    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// The query has no key and will not run
    pub fn is_disabled(&self) -> bool {
        self.key.is_none()
    }

    /// Borrow the value to render
    pub fn data(&self) -> Option<&T> {
        self.data.as_deref()
    }

    /// Message to show in a failure notice
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }
}

impl<T> From<CacheEntry<T>> for QueryResult<T> {
    fn from(entry: CacheEntry<T>) -> Self {
        Self {
            key: Some(entry.key),
            status: entry.status,
            fetch_status: if entry.is_fetching {
                FetchStatus::Fetching
            } else {
                FetchStatus::Idle
            },
            data: entry.data,
            error: entry.error,
            is_placeholder: false,
        }
    }
}

/// Per-consumer view over a query whose key can change.
///
/// Remembers the last data it handed out so that, while a new key is
/// still pending, the previous result stays visible instead of the
/// consumer dropping back to an empty loading state. Before anything has
/// been observed, a pending key shows as plain loading.
#[derive(Debug)]
pub struct QueryObserver<T> {
    last: Option<(QueryKey, Arc<T>)>,
}

impl<T> Default for QueryObserver<T> {
    fn default() -> Self {
        Self { last: None }
    }
}

impl<T> QueryObserver<T> {
    /// Observer that has shown nothing yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve what to show for `key` given its cache entry, if any.
    pub fn observe(&mut self, key: &QueryKey, entry: Option<CacheEntry<T>>) -> QueryResult<T> {
        let mut result = match entry {
            Some(entry) => QueryResult::from(entry),
            None => QueryResult {
                key: Some(key.clone()),
                status: QueryStatus::Pending,
                fetch_status: FetchStatus::Idle,
                data: None,
                error: None,
                is_placeholder: false,
            },
        };

        if let Some(data) = &result.data {
            self.last = Some((key.clone(), Arc::clone(data)));
            return result;
        }

        if result.status == QueryStatus::Pending {
            if let Some((previous, data)) = &self.last {
                if previous != key {
                    result.data = Some(Arc::clone(data));
                    result.is_placeholder = true;
                }
            }
        }

        result
    }

    /// Key of the data last shown, if any
    pub fn last_key(&self) -> Option<&QueryKey> {
        self.last.as_ref().map(|(key, _)| key)
    }
}
