//! Single-flight TTL cache.
//!
//! Concurrent lookups of the same key coalesce into one fetch: the first
//! caller fetches while later callers wait on a watch channel, bounded by a
//! wait timeout. Fresh values are served from a `moka` cache until their TTL
//! expires; in-flight fetches are tracked in a `DashMap`.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use facetry_core::{Error, Result};
use tokio::sync::watch;

type InFlightResult<V> = std::result::Result<V, Arc<str>>;
type InFlightSender<V> = Arc<watch::Sender<Option<InFlightResult<V>>>>;

enum Role<V> {
    Fetch(InFlightSender<V>, u64),
    Wait(watch::Receiver<Option<InFlightResult<V>>>),
}

/// Cache that deduplicates concurrent fetches per key.
pub struct SingleFlightCache<K, V> {
    ready: moka::sync::Cache<K, V>,
    in_flight: DashMap<K, InFlightSender<V>>,
    // Bumped by every invalidation; a fetch that started under an older
    // generation is handed to its waiters but not cached.
    generation: AtomicU64,
    wait_timeout: Duration,
}

impl<K, V> std::fmt::Debug for SingleFlightCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFlightCache")
            .field("ttl", &self.ready.policy().time_to_live())
            .field("wait_timeout", &self.wait_timeout)
            .field("ready", &self.ready.entry_count())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

impl<K, V> SingleFlightCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache with a time-to-live and a maximum wait on in-flight
    /// fetches.
    pub fn new(ttl: Duration, wait_timeout: Duration) -> Self {
        Self {
            ready: moka::sync::Cache::builder().time_to_live(ttl).build(),
            in_flight: DashMap::new(),
            generation: AtomicU64::new(0),
            wait_timeout,
        }
    }

    /// Return the cached value, or run `fetch` once for all concurrent
    /// callers of the same key.
    ///
    /// # Errors
    ///
    /// Returns the fetch error (shared with waiters as a backend error), or
    /// [`Error::Timeout`] when waiting on another caller's fetch takes
    /// longer than the wait timeout.
    pub async fn get_or_fetch<F, Fut>(&self, key: &K, fetch: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(value) = self.ready.get(key) {
            return Ok(value);
        }

        let role = match self.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => Role::Wait(entry.get().subscribe()),
            Entry::Vacant(entry) => {
                let (tx, _rx) = watch::channel(None);
                let tx = Arc::new(tx);
                entry.insert(Arc::clone(&tx));
                Role::Fetch(tx, self.generation.load(Ordering::SeqCst))
            }
        };
        let (tx, generation) = match role {
            Role::Wait(rx) => return self.wait(rx).await,
            Role::Fetch(tx, generation) => (tx, generation),
        };

        let guard = InFlightGuard {
            cache: self,
            key: key.clone(),
            tx,
            finished: false,
        };
        let result = fetch().await;
        guard.finish(&result, generation);
        result
    }

    async fn wait(&self, mut rx: watch::Receiver<Option<InFlightResult<V>>>) -> Result<V> {
        let outcome = match tokio::time::timeout(self.wait_timeout, rx.wait_for(Option::is_some)).await
        {
            Ok(Ok(value)) => (*value).clone(),
            Ok(Err(_)) => return Err(Error::backend("in-flight fetch was abandoned")),
            Err(_) => {
                return Err(Error::timeout(
                    "in-flight fetch",
                    self.wait_timeout.as_secs(),
                ));
            }
        };
        match outcome {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(Error::backend(message.to_string())),
            None => Err(Error::backend("in-flight fetch produced no value")),
        }
    }

    /// Drop the cached value of a key. A fetch already in flight completes
    /// for its waiters but is not cached.
    pub fn invalidate(&self, key: &K) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.ready.invalidate(key);
    }

    /// Drop every cached value.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.ready.invalidate_all();
    }
}

/// Removes the in-flight entry when the fetching future is dropped, so
/// waiters observe a closed channel instead of hanging.
struct InFlightGuard<'a, K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    cache: &'a SingleFlightCache<K, V>,
    key: K,
    tx: InFlightSender<V>,
    finished: bool,
}

impl<K, V> InFlightGuard<'_, K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn finish(mut self, result: &Result<V>, generation: u64) {
        let message = match result {
            Ok(value) => {
                if self.cache.generation.load(Ordering::SeqCst) == generation {
                    self.cache.ready.insert(self.key.clone(), value.clone());
                }
                Ok(value.clone())
            }
            Err(e) => Err(Arc::from(e.to_string())),
        };
        // Send before removing so late subscribers still observe the result.
        self.tx.send_replace(Some(message));
        self.cache.in_flight.remove(&self.key);
        self.finished = true;
    }
}

impl<K, V> Drop for InFlightGuard<'_, K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if !self.finished {
            self.cache.in_flight.remove(&self.key);
        }
    }
}
