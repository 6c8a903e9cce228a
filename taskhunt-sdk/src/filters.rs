//! Filter state store
//!
//! Holds the user's current filter selections as independently settable
//! fields. The store is a cheap, cloneable handle; every clone sees the
//! same state, and subscribers are woken only when a value actually
//! changes.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::resources::tasks::TaskFilters;

/// Current filter selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    /// Selected benchmark, `None` for all
    pub benchmark: Option<String>,
    /// Selected difficulty, `None` for all
    pub difficulty: Option<String>,
    /// Selected category, `None` for all
    pub category: Option<String>,
    /// Search text, empty when unused
    pub search: String,
    /// Include PR-sourced tasks in listings
    pub include_prs: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            benchmark: None,
            difficulty: None,
            category: None,
            search: String::new(),
            include_prs: true,
        }
    }
}

impl FilterState {
    /// Project the selections onto listing filters. An empty search is
    /// left out; `include_prs` is always carried.
    pub fn to_filters(&self) -> TaskFilters {
        TaskFilters {
            benchmark: self.benchmark.clone(),
            difficulty: self.difficulty.clone(),
            category: self.category.clone(),
            search: Some(self.search.clone()).filter(|s| !s.is_empty()),
            include_prs: Some(self.include_prs),
            limit: None,
            offset: None,
        }
    }

    /// True when any of benchmark, difficulty or category is set
    pub fn has_active_filters(&self) -> bool {
        self.benchmark.is_some() || self.difficulty.is_some() || self.category.is_some()
    }
}

/// Shared, observable holder of a [`FilterState`].
#[derive(Debug, Clone)]
pub struct FilterStore {
    state: Arc<watch::Sender<FilterState>>,
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterStore {
    /// Create a store with default selections
    pub fn new() -> Self {
        Self::with_state(FilterState::default())
    }

    /// Create a store starting from the given selections
    pub fn with_state(state: FilterState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self {
            state: Arc::new(tx),
        }
    }

    /// Copy of the current selections
    pub fn snapshot(&self) -> FilterState {
        self.state.borrow().clone()
    }

    /// Receiver that is notified whenever a selection changes
    pub fn subscribe(&self) -> watch::Receiver<FilterState> {
        self.state.subscribe()
    }

    /// Selected benchmark
    pub fn benchmark(&self) -> Option<String> {
        self.state.borrow().benchmark.clone()
    }

    /// Selected difficulty
    pub fn difficulty(&self) -> Option<String> {
        self.state.borrow().difficulty.clone()
    }

    /// Selected category
    pub fn category(&self) -> Option<String> {
        self.state.borrow().category.clone()
    }

    /// Current search text
    pub fn search(&self) -> String {
        self.state.borrow().search.clone()
    }

    /// Whether PR tasks are included
    pub fn include_prs(&self) -> bool {
        self.state.borrow().include_prs
    }

    /// Select a benchmark; `None` or an empty string unsets it.
    /// Returns whether the value changed.
    pub fn set_benchmark(&self, benchmark: Option<String>) -> bool {
        let value = non_empty(benchmark);
        self.update("benchmark", |s| replace_if_changed(&mut s.benchmark, value))
    }

    /// Select a difficulty; `None` or an empty string unsets it
    pub fn set_difficulty(&self, difficulty: Option<String>) -> bool {
        let value = non_empty(difficulty);
        self.update("difficulty", |s| replace_if_changed(&mut s.difficulty, value))
    }

    /// Select a category; `None` or an empty string unsets it
    pub fn set_category(&self, category: Option<String>) -> bool {
        let value = non_empty(category);
        self.update("category", |s| replace_if_changed(&mut s.category, value))
    }

    /// Set the free-text search
    pub fn set_search(&self, search: impl Into<String>) -> bool {
        let value = search.into();
        self.update("search", |s| replace_if_changed(&mut s.search, value))
    }

    /// Toggle whether PR tasks are listed
    pub fn set_include_prs(&self, include_prs: bool) -> bool {
        self.update("include_prs", |s| replace_if_changed(&mut s.include_prs, include_prs))
    }

    /// Unset benchmark, difficulty and category. Search text and the
    /// include-PRs toggle are left as they are.
    pub fn clear_filters(&self) -> bool {
        self.update("clear", |s| {
            let changed = s.has_active_filters();
            s.benchmark = None;
            s.difficulty = None;
            s.category = None;
            changed
        })
    }

    /// True when any of benchmark, difficulty or category is set
    pub fn has_active_filters(&self) -> bool {
        self.state.borrow().has_active_filters()
    }

    fn update(&self, field: &str, modify: impl FnOnce(&mut FilterState) -> bool) -> bool {
        let changed = self.state.send_if_modified(modify);
        if changed {
            debug!(field, "Filter updated");
        }
        changed
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let store = FilterStore::new();
        let state = store.snapshot();

        assert_eq!(state, FilterState::default());
        assert!(state.include_prs);
        assert!(state.search.is_empty());
        assert!(!store.has_active_filters());
    }

    #[test]
    fn test_fields_are_independent() {
        let store = FilterStore::new();
        store.set_benchmark(Some("tb-core".to_string()));
        store.set_category(Some("security".to_string()));
        store.set_include_prs(false);

        assert_eq!(store.benchmark().as_deref(), Some("tb-core"));
        assert_eq!(store.difficulty(), None);
        assert_eq!(store.category().as_deref(), Some("security"));
        assert!(!store.include_prs());
    }

    #[test]
    fn test_empty_selection_unsets() {
        let store = FilterStore::new();
        store.set_difficulty(Some("easy".to_string()));
        store.set_difficulty(Some(String::new()));
        assert_eq!(store.difficulty(), None);
    }

    #[test]
    fn test_clear_filters_keeps_search_and_include_prs() {
        let store = FilterStore::new();
        store.set_benchmark(Some("tb-core".to_string()));
        store.set_difficulty(Some("easy".to_string()));
        store.set_category(Some("security".to_string()));
        store.set_search("nginx");
        store.set_include_prs(false);

        assert!(store.clear_filters());

        let state = store.snapshot();
        assert_eq!(state.benchmark, None);
        assert_eq!(state.difficulty, None);
        assert_eq!(state.category, None);
        assert_eq!(state.search, "nginx");
        assert!(!state.include_prs);
    }

    #[test]
    fn test_to_filters() {
        let state = FilterState {
            benchmark: Some("tb-core".to_string()),
            ..Default::default()
        };
        assert_eq!(
            state.to_filters(),
            TaskFilters::new().with_benchmark("tb-core").with_include_prs(true)
        );

        let state = FilterState {
            search: "grep".to_string(),
            include_prs: false,
            ..Default::default()
        };
        assert_eq!(
            state.to_filters(),
            TaskFilters::new().with_search("grep").with_include_prs(false)
        );
    }

    #[tokio::test]
    async fn test_subscribers_see_changes_only() {
        let store = FilterStore::new();
        let mut rx = store.subscribe();

        assert!(!store.set_include_prs(true));
        assert!(!rx.has_changed().unwrap());

        let writer = store.clone();
        assert!(writer.set_search("redis"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().search, "redis");

        assert!(!store.clear_filters());
        assert!(!rx.has_changed().unwrap());
    }
}
