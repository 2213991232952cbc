//! Key-addressed query cache with shared in-flight fetches and
//! prefix invalidation.
//!
//! The server is the only source of truth: entries are never edited except
//! through [`QueryCache::patch`], a narrow optimistic update of one cached
//! entity. Everything else goes through invalidation and refetch.

mod key;

pub use key::QueryKey;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::config::QueryConfig;
use crate::error::{BellbookError, Result};
use crate::util::retry::RetryPolicy;

const INVALIDATION_CHANNEL_CAPACITY: usize = 64;

type FetchOutcome = std::result::Result<Value, Arc<BellbookError>>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

/// Per-call overrides of the cache defaults.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub stale_time: Option<Duration>,
    pub retry: Option<RetryPolicy>,
}

impl FetchOptions {
    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = Some(stale_time);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }
}

/// Observable metadata of one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryState {
    pub has_data: bool,
    pub stale: bool,
    pub fetching: bool,
    pub error: Option<String>,
}

/// Shared query cache. Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Mutex<CacheInner>>,
    invalidations: broadcast::Sender<QueryKey>,
    config: QueryConfig,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<QueryKey, CacheEntry>,
    next_fetch_id: u64,
}

struct CacheEntry {
    data: Option<Value>,
    updated_at: Option<Instant>,
    last_accessed: Instant,
    stale: bool,
    error: Option<Arc<BellbookError>>,
    generation: u64,
    in_flight: Option<InFlight>,
}

struct InFlight {
    id: u64,
    generation: u64,
    fetch: SharedFetch,
}

impl CacheEntry {
    fn new(now: Instant) -> Self {
        Self {
            data: None,
            updated_at: None,
            last_accessed: now,
            stale: false,
            error: None,
            generation: 0,
            in_flight: None,
        }
    }

    fn fresh_data(&self, now: Instant, stale_time: Duration) -> Option<&Value> {
        let updated_at = self.updated_at?;
        if self.stale || now.duration_since(updated_at) >= stale_time {
            return None;
        }
        self.data.as_ref()
    }
}

impl QueryCache {
    pub fn new(config: QueryConfig) -> Self {
        let (invalidations, _rx) = broadcast::channel(INVALIDATION_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(CacheInner::default())),
            invalidations,
            config,
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Return fresh cached data for `key`, or run `fetcher`.
    ///
    /// At most one fetch per key is in flight; concurrent callers await the
    /// same one and receive the same result.
    pub async fn fetch<F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<Value>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.fetch_with(key, FetchOptions::default(), fetcher).await
    }

    pub async fn fetch_with<F, Fut>(
        &self,
        key: &QueryKey,
        options: FetchOptions,
        fetcher: F,
    ) -> Result<Value>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let stale_time = options.stale_time.unwrap_or(self.config.stale_time);
        let now = Instant::now();

        let (id, fetch) = {
            let mut inner = self.lock();
            inner.collect_garbage(now, self.config.gc_time);
            inner.next_fetch_id += 1;
            let next_id = inner.next_fetch_id;

            let entry = inner
                .entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(now));
            entry.last_accessed = now;

            if let Some(data) = entry.fresh_data(now, stale_time) {
                return Ok(data.clone());
            }

            let joined = entry
                .in_flight
                .as_ref()
                .map(|flight| (flight.id, flight.fetch.clone()));
            match joined {
                Some(joined) => joined,
                None => {
                    let policy = options.retry.unwrap_or_else(|| self.config.retry.clone());
                    let fetch = async move { policy.execute(fetcher).await.map_err(Arc::new) }
                        .boxed()
                        .shared();
                    tracing::debug!(key = %key, "query fetch started");
                    entry.in_flight = Some(InFlight {
                        id: next_id,
                        generation: entry.generation,
                        fetch: fetch.clone(),
                    });
                    (next_id, fetch)
                }
            }
        };

        let outcome = fetch.await;
        self.complete(key, id, &outcome);
        outcome.map_err(BellbookError::from)
    }

    /// [`fetch`](Self::fetch) decoded into `T`.
    pub async fn fetch_as<T, F, Fut>(
        &self,
        key: &QueryKey,
        options: FetchOptions,
        fetcher: F,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let value = self.fetch_with(key, options, fetcher).await?;
        Ok(serde_json::from_value(value)?)
    }

    fn complete(&self, key: &QueryKey, id: u64, outcome: &FetchOutcome) {
        let mut inner = self.lock();
        let Some(entry) = inner.entries.get_mut(key) else {
            return;
        };
        if entry.in_flight.as_ref().map(|f| f.id) != Some(id) {
            return;
        }
        let Some(flight) = entry.in_flight.take() else {
            return;
        };
        match outcome {
            Ok(value) => {
                entry.data = Some(value.clone());
                entry.updated_at = Some(Instant::now());
                entry.error = None;
                entry.stale = flight.generation != entry.generation;
            }
            Err(err) => entry.error = Some(err.clone()),
        }
    }

    /// Mark every entry under `prefix` stale and notify subscribers.
    ///
    /// A fetch already in flight still delivers to its waiters, but its
    /// result is stored as stale so the next read refetches.
    pub fn invalidate(&self, prefix: &QueryKey) -> Vec<QueryKey> {
        let mut invalidated = Vec::new();
        {
            let mut inner = self.lock();
            for (key, entry) in inner.entries.iter_mut() {
                if key.starts_with(prefix) {
                    entry.stale = true;
                    entry.generation += 1;
                    invalidated.push(key.clone());
                }
            }
        }
        invalidated.sort();
        tracing::debug!(prefix = %prefix, count = invalidated.len(), "invalidated queries");
        for key in &invalidated {
            let _ = self.invalidations.send(key.clone());
        }
        invalidated
    }

    /// Receive the key of every entry invalidated from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.invalidations.subscribe()
    }

    /// [`subscribe`](Self::subscribe) as a stream. Keys missed by a lagging
    /// reader are skipped.
    pub fn invalidation_stream(&self) -> impl Stream<Item = QueryKey> + Send + 'static {
        BroadcastStream::new(self.subscribe()).filter_map(|key| key.ok())
    }

    /// Apply a partial update to one cached entity. Returns false when the
    /// entry holds no data. Freshness is left untouched.
    pub fn patch<F>(&self, key: &QueryKey, update: F) -> bool
    where
        F: FnOnce(&mut Value),
    {
        let mut inner = self.lock();
        match inner.entries.get_mut(key).and_then(|e| e.data.as_mut()) {
            Some(data) => {
                update(data);
                true
            }
            None => false,
        }
    }

    /// Last-known data for `key`, fresh or not.
    pub fn get(&self, key: &QueryKey) -> Option<Value> {
        self.lock().entries.get(key).and_then(|e| e.data.clone())
    }

    pub fn get_as<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        serde_json::from_value(self.get(key)?).ok()
    }

    pub fn state(&self, key: &QueryKey) -> Option<EntryState> {
        self.lock().entries.get(key).map(|e| EntryState {
            has_data: e.data.is_some(),
            stale: e.stale,
            fetching: e.in_flight.is_some(),
            error: e.error.as_ref().map(|err| err.to_string()),
        })
    }

    /// Drop every entry (logout).
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheInner {
    fn collect_garbage(&mut self, now: Instant, gc_time: Duration) {
        self.entries.retain(|_, e| {
            e.in_flight.is_some() || now.duration_since(e.last_accessed) <= gc_time
        });
    }
}
