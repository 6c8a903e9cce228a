//! Request cache with in-flight de-duplication.
//!
//! One slot per [`QueryKey`]. A slot remembers the last applied result,
//! the request currently in flight (if any) and sequence numbers that
//! decide whether a late response may still be applied. Sequence numbers
//! are drawn from one counter per cache, so they never repeat for a key
//! even after it is invalidated.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::error::{SdkError, SdkResult};
use crate::query::key::QueryKey;

/// Lifecycle state of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// No response applied yet
    Pending,
    /// Last applied response succeeded
    Success,
    /// Last applied response failed
    Error,
}

type FetchOutcome<T> = Result<Arc<T>, Arc<SdkError>>;
type SharedFetch<T> = Shared<BoxFuture<'static, FetchOutcome<T>>>;

/// Stored status and result for one key.
#[derive(Debug)]
pub struct CacheEntry<T> {
    /// Key this entry belongs to
    pub key: QueryKey,
    /// Outcome of the last applied response
    pub status: QueryStatus,
    /// Last successful value. Kept when a later attempt fails.
    pub data: Option<Arc<T>>,
    /// Error of the last applied response, cleared by a later success
    pub error: Option<Arc<SdkError>>,
    /// When the last response was applied
    pub updated_at: Option<DateTime<Utc>>,
    /// A request for this key is in flight
    pub is_fetching: bool,
}

impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            updated_at: self.updated_at,
            is_fetching: self.is_fetching,
        }
    }
}

impl<T> CacheEntry<T> {
    fn pending(key: QueryKey) -> Self {
        Self {
            key,
            status: QueryStatus::Pending,
            data: None,
            error: None,
            updated_at: None,
            is_fetching: false,
        }
    }

    fn settle(&mut self, outcome: FetchOutcome<T>) {
        match outcome {
            Ok(value) => {
                self.status = QueryStatus::Success;
                self.data = Some(value);
                self.error = None;
            }
            Err(error) => {
                self.status = QueryStatus::Error;
                self.error = Some(error);
            }
        }
        self.updated_at = Some(Utc::now());
    }
}

struct Slot<T> {
    entry: CacheEntry<T>,
    in_flight: Option<(u64, SharedFetch<T>)>,
    /// Requests numbered at or below this were issued before the slot
    /// existed and belong to an invalidated generation.
    floor: u64,
    applied: u64,
}

impl<T: Send + Sync + 'static> Slot<T> {
    fn new(key: QueryKey, floor: u64) -> Self {
        Self {
            entry: CacheEntry::pending(key),
            in_flight: None,
            floor,
            applied: floor,
        }
    }

    fn start<F, Fut>(&mut self, seq: u64, fetcher: F) -> (u64, SharedFetch<T>)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SdkResult<T>> + Send + 'static,
    {
        let request = fetcher()
            .map(|result| result.map(Arc::new).map_err(Arc::new))
            .boxed()
            .shared();
        self.in_flight = Some((seq, request.clone()));
        (seq, request)
    }

    fn snapshot(&self) -> CacheEntry<T> {
        let mut entry = self.entry.clone();
        entry.is_fetching = self.in_flight.is_some();
        entry
    }
}

/// Cache of request results keyed by [`QueryKey`].
///
/// Entries never expire on their own; they are replaced by a refetch or
/// dropped by [`QueryCache::invalidate`].
pub struct QueryCache<T> {
    slots: DashMap<QueryKey, Slot<T>>,
    issued: AtomicU64,
}

impl<T: Send + Sync + 'static> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> QueryCache<T> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            issued: AtomicU64::new(0),
        }
    }

    fn next_seq(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn new_slot(&self, key: &QueryKey) -> Slot<T> {
        Slot::new(key.clone(), self.issued.load(Ordering::SeqCst))
    }

    /// Return the settled entry for `key`, join the request already in
    /// flight for it, or start one with `fetcher`.
    pub async fn fetch<F, Fut>(&self, key: &QueryKey, fetcher: F) -> CacheEntry<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SdkResult<T>> + Send + 'static,
    {
        let (seq, request) = {
            let mut slot = self
                .slots
                .entry(key.clone())
                .or_insert_with(|| self.new_slot(key));

            if let Some((seq, request)) = &slot.in_flight {
                debug!(key = %key, "Joining in-flight request");
                (*seq, request.clone())
            } else if slot.entry.status != QueryStatus::Pending {
                debug!(key = %key, "Cache hit");
                return slot.snapshot();
            } else {
                debug!(key = %key, "Cache miss, issuing request");
                slot.start(self.next_seq(), fetcher)
            }
        };

        let outcome = request.await;
        self.apply(key, seq, outcome)
    }

    /// Issue a new request for `key` even when a result is cached or a
    /// request is already in flight. The older request is not aborted;
    /// its response is dropped if this one lands first.
    pub async fn refetch<F, Fut>(&self, key: &QueryKey, fetcher: F) -> CacheEntry<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SdkResult<T>> + Send + 'static,
    {
        let (seq, request) = {
            let mut slot = self
                .slots
                .entry(key.clone())
                .or_insert_with(|| self.new_slot(key));
            debug!(key = %key, "Refetching");
            slot.start(self.next_seq(), fetcher)
        };

        let outcome = request.await;
        self.apply(key, seq, outcome)
    }

    /// Current entry for `key`, without triggering anything
    pub fn peek(&self, key: &QueryKey) -> Option<CacheEntry<T>> {
        self.slots.get(key).map(|slot| slot.snapshot())
    }

    /// Forget `key`. A response still in flight for it is not stored.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        self.slots.remove(key).is_some()
    }

    /// Forget every key
    pub fn clear(&self) {
        self.slots.clear();
    }

    /// Number of keys currently held
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no key is held
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn apply(&self, key: &QueryKey, seq: u64, outcome: FetchOutcome<T>) -> CacheEntry<T> {
        let current = self.slots.get_mut(key).filter(|slot| seq > slot.floor);
        let Some(mut slot) = current else {
            debug!(key = %key, "Key invalidated while in flight, result not cached");
            let mut entry = CacheEntry::pending(key.clone());
            entry.settle(outcome);
            return entry;
        };

        if seq > slot.applied {
            slot.applied = seq;
            slot.entry.settle(outcome);
        } else if seq < slot.applied {
            debug!(key = %key, seq, applied = slot.applied, "Discarding superseded response");
        }

        if slot.in_flight.as_ref().is_some_and(|(current, _)| *current == seq) {
            slot.in_flight = None;
        }

        slot.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    fn key() -> QueryKey {
        QueryKey::search("nginx")
    }

    fn not_found() -> SdkError {
        SdkError::from_response(404, "")
    }

    #[tokio::test]
    async fn test_first_fetch_then_cache_hit() {
        let cache: QueryCache<u32> = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let entry = cache
                .fetch(&key(), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await;
            assert_eq!(entry.status, QueryStatus::Success);
            assert_eq!(entry.data.as_deref(), Some(&7));
            assert!(!entry.is_fetching);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.peek(&key()).unwrap().updated_at.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_request() {
        let cache: QueryCache<u32> = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel::<u32>();
        let k = key();

        let first = {
            let calls = Arc::clone(&calls);
            cache.fetch(&k, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(rx.await.unwrap())
            })
        };
        let second = {
            let calls = Arc::clone(&calls);
            cache.fetch(&k, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(0)
            })
        };
        let release = async {
            tokio::task::yield_now().await;
            let pending = cache.peek(&key()).unwrap();
            assert_eq!(pending.status, QueryStatus::Pending);
            assert!(pending.is_fetching);
            tx.send(11).unwrap();
        };

        let (a, b, ()) = tokio::join!(first, second, release);
        assert_eq!(a.data.as_deref(), Some(&11));
        assert_eq!(b.data.as_deref(), Some(&11));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_is_terminal_until_refetch() {
        let cache: QueryCache<u32> = QueryCache::new();

        let entry = cache.fetch(&key(), || async { Err(not_found()) }).await;
        assert_eq!(entry.status, QueryStatus::Error);
        assert!(entry.error.as_ref().unwrap().is_not_found());

        let entry = cache.fetch(&key(), || async { Ok(1) }).await;
        assert_eq!(entry.status, QueryStatus::Error);

        let entry = cache.refetch(&key(), || async { Ok(1) }).await;
        assert_eq!(entry.status, QueryStatus::Success);
        assert!(entry.error.is_none());
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_last_good_data() {
        let cache: QueryCache<u32> = QueryCache::new();
        cache.fetch(&key(), || async { Ok(5) }).await;

        let entry = cache.refetch(&key(), || async { Err(not_found()) }).await;
        assert_eq!(entry.status, QueryStatus::Error);
        assert_eq!(entry.data.as_deref(), Some(&5));
    }

    #[tokio::test]
    async fn test_superseded_response_is_discarded() {
        let cache: QueryCache<&'static str> = QueryCache::new();
        let (old_tx, old_rx) = oneshot::channel::<&'static str>();
        let (new_tx, new_rx) = oneshot::channel::<&'static str>();

        let k = key();
        let old = cache.fetch(&k, move || async move { Ok(old_rx.await.unwrap()) });
        let new = cache.refetch(&k, move || async move { Ok(new_rx.await.unwrap()) });
        let drive = async {
            tokio::task::yield_now().await;
            new_tx.send("new").unwrap();
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            old_tx.send("old").unwrap();
        };

        let (old_entry, new_entry, ()) = tokio::join!(old, new, drive);
        assert_eq!(new_entry.data.as_deref(), Some(&"new"));
        assert_eq!(old_entry.data.as_deref(), Some(&"new"));
        assert_eq!(cache.peek(&key()).unwrap().data.as_deref(), Some(&"new"));
        assert!(!cache.peek(&key()).unwrap().is_fetching);
    }

    #[tokio::test]
    async fn test_older_response_applies_when_it_lands_first() {
        let cache: QueryCache<&'static str> = QueryCache::new();
        let (old_tx, old_rx) = oneshot::channel::<&'static str>();
        let (new_tx, new_rx) = oneshot::channel::<&'static str>();

        let k = key();
        let old = cache.fetch(&k, move || async move { Ok(old_rx.await.unwrap()) });
        let new = cache.refetch(&k, move || async move { Ok(new_rx.await.unwrap()) });
        let drive = async {
            tokio::task::yield_now().await;
            old_tx.send("old").unwrap();
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            let mid = cache.peek(&key()).unwrap();
            assert_eq!(mid.data.as_deref(), Some(&"old"));
            assert!(mid.is_fetching);
            new_tx.send("new").unwrap();
        };

        let (_, new_entry, ()) = tokio::join!(old, new, drive);
        assert_eq!(new_entry.data.as_deref(), Some(&"new"));
    }

    #[tokio::test]
    async fn test_invalidate_forces_new_request() {
        let cache: QueryCache<u32> = QueryCache::new();
        cache.fetch(&key(), || async { Ok(1) }).await;
        assert_eq!(cache.len(), 1);

        assert!(cache.invalidate(&key()));
        assert!(cache.is_empty());
        assert!(cache.peek(&key()).is_none());

        let entry = cache.fetch(&key(), || async { Ok(2) }).await;
        assert_eq!(entry.data.as_deref(), Some(&2));
    }

    #[tokio::test]
    async fn test_response_from_before_invalidate_is_not_stored() {
        let cache: QueryCache<&'static str> = QueryCache::new();
        let (old_tx, old_rx) = oneshot::channel::<&'static str>();
        let (new_tx, new_rx) = oneshot::channel::<&'static str>();
        let k = key();

        let old = cache.fetch(&k, move || async move { Ok(old_rx.await.unwrap()) });
        let new = async {
            tokio::task::yield_now().await;
            assert!(cache.invalidate(&k));
            cache
                .fetch(&k, move || async move { Ok(new_rx.await.unwrap()) })
                .await
        };
        let drive = async {
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            old_tx.send("old").unwrap();
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            let mid = cache.peek(&k).unwrap();
            assert_eq!(mid.status, QueryStatus::Pending);
            assert!(mid.data.is_none());
            assert!(mid.is_fetching);
            new_tx.send("new").unwrap();
        };

        let (old_entry, new_entry, ()) = tokio::join!(old, new, drive);
        assert_eq!(old_entry.data.as_deref(), Some(&"old"));
        assert_eq!(new_entry.data.as_deref(), Some(&"new"));
        let settled = cache.peek(&k).unwrap();
        assert_eq!(settled.data.as_deref(), Some(&"new"));
        assert!(!settled.is_fetching);
    }

    #[tokio::test]
    async fn test_sequence_numbers_survive_invalidate() {
        let cache: QueryCache<u32> = QueryCache::new();
        cache.fetch(&key(), || async { Ok(1) }).await;
        cache.invalidate(&key());
        cache.fetch(&key(), || async { Ok(2) }).await;

        assert_eq!(cache.issued.load(Ordering::SeqCst), 2);
        let slot = cache.slots.get(&key()).unwrap();
        assert_eq!(slot.floor, 1);
        assert_eq!(slot.applied, 2);
    }
}
