//! Short-lived memoization of fetch results keyed by request signature.

use super::error::is_limit_error;
use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Deterministic cache key for an operation and its parameters. Parameters that cannot
/// be serialized are an error rather than a shared fallback key.
pub fn cache_key(operation: &str, params: &impl Serialize) -> Result<String> {
    let params = serde_json::to_string(params)
        .with_context(|| format!("Failed to build cache key for {operation}"))?;
    Ok(format!("{operation}:{params}"))
}

struct CacheEntry<V> {
    value: Result<V, String>,
    stored_at: Instant,
}

type Entries<V> = Arc<Mutex<HashMap<String, CacheEntry<V>>>>;

/// Caches producer results, failures included, for `ttl`.
///
/// Quota and rate-limit denials are never cached since they say nothing about upstream.
/// A sweeper started with [`TtlCache::start`] evicts entries older than twice the TTL
/// every TTL interval; [`TtlCache::shutdown`] (or dropping the cache) stops it.
pub struct TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    ttl: Duration,
    entries: Entries<V>,
    sweeper: Option<JoinHandle<()>>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache without a background sweeper.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
            sweeper: None,
        }
    }

    /// Creates a cache and spawns its sweeper on the current tokio runtime.
    /// A zero TTL caches nothing, so no sweeper is started.
    pub fn start(ttl: Duration) -> Self {
        let mut cache = Self::new(ttl);
        if ttl.is_zero() {
            return cache;
        }
        let entries = Arc::clone(&cache.entries);
        cache.sweeper = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(ttl);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                sweep_entries(&entries, ttl).await;
            }
        }));
        cache
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the fresh cached result for `key`, or runs `producer` and stores what it
    /// returns. `force_refresh` skips the freshness check but still writes through.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        force_refresh: bool,
        producer: F,
    ) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if !force_refresh {
            let entries = self.entries.lock().await;
            if let Some(entry) = entries.get(key) {
                if entry.stored_at.elapsed() < self.ttl {
                    debug!("Cache HIT for key: {:?}", key);
                    return entry.value.clone().map_err(|e| anyhow!(e));
                }
                debug!("Cache entry expired for key: {:?}", key);
            } else {
                debug!("Cache MISS for key: {:?}", key);
            }
        }

        let result = producer().await;
        if self.ttl.is_zero() {
            return result;
        }
        if let Err(e) = &result {
            if is_limit_error(e) {
                return result;
            }
        }

        let entry = CacheEntry {
            value: match &result {
                Ok(value) => Ok(value.clone()),
                Err(e) => Err(format!("{e:#}")),
            },
            stored_at: Instant::now(),
        };
        debug!("Cache PUT for key: {:?}", key);
        self.entries.lock().await.insert(key.to_string(), entry);
        result
    }

    /// Evicts entries older than twice the TTL. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        sweep_entries(&self.entries, self.ttl).await
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
        debug!("Cache CLEAR");
    }

    /// Stops the background sweeper. Cached entries stay readable.
    pub fn shutdown(&self) {
        if let Some(handle) = &self.sweeper {
            handle.abort();
            debug!("Cache sweeper stopped");
        }
    }
}

impl<V> Drop for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn sweep_entries<V>(
    entries: &Mutex<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
) -> usize {
    let max_age = ttl * 2;
    let mut entries = entries.lock().await;
    let before = entries.len();
    entries.retain(|_, entry| entry.stored_at.elapsed() < max_age);
    let evicted = before - entries.len();
    if evicted > 0 {
        debug!("Cache SWEEP evicted {} entries", evicted);
    }
    evicted
}
