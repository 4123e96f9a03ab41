//! Cache Manager Module
//!
//! Sole owner of serialization, TTL application and store access. Every
//! operation is best-effort: store failures are logged and turned into a
//! miss or a `false`, never into a failed request.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CacheMetrics, CacheStats};
use crate::error::{CacheError, Result};
use crate::store::KvStore;

// == Cache Manager ==
/// Typed, fault-tolerant front for a [`KvStore`].
///
/// Cheap to clone; clones share the store handle and the counters.
#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn KvStore>,
    op_timeout: Duration,
    metrics: Arc<CacheMetrics>,
}

impl CacheManager {
    /// Wraps an already opened store. `op_timeout` bounds every store call.
    pub fn new(store: Arc<dyn KvStore>, op_timeout: Duration) -> Self {
        Self {
            store,
            op_timeout,
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    /// Runs one store call under the operation timeout. Single attempt.
    async fn call<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.op_timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.op_timeout.as_millis() as u64)),
        }
    }

    fn store_failed(&self, op: &'static str, subject: &str, err: &CacheError) {
        self.metrics.record_store_error();
        warn!(op, subject, error = %err, "Cache store call failed; degrading");
    }

    /// Store read that leaves the hit/miss counters alone; store failures
    /// come back as `None`.
    async fn load(&self, key: &str) -> Option<String> {
        match self.call(self.store.get(key)).await {
            Ok(raw) => raw,
            Err(err) => {
                self.store_failed("get", key, &err);
                None
            }
        }
    }

    fn record_lookup(&self, hit: bool) {
        if hit {
            self.metrics.record_hit();
        } else {
            self.metrics.record_miss();
        }
    }

    // == Raw Access ==
    /// Reads the stored JSON text for `key`.
    ///
    /// A payload that is not valid JSON is discarded and counted as a miss.
    pub async fn get_raw(&self, key: &str) -> Option<String> {
        let raw = self.load(key).await.filter(|raw| {
            let valid = is_json_text(raw);
            if !valid {
                warn!(key, "Cached payload is not JSON; treating as a miss");
            }
            valid
        });
        self.record_lookup(raw.is_some());
        raw
    }

    /// Stores already serialized JSON text under `key` for `ttl_secs`.
    pub async fn set_raw(&self, key: &str, json: &str, ttl_secs: u64) -> bool {
        if ttl_secs == 0 {
            warn!(key, "Refusing to cache with a zero TTL");
            return false;
        }
        match self.call(self.store.set_ex(key, json, ttl_secs)).await {
            Ok(()) => {
                self.metrics.record_set();
                debug!(key, ttl_secs, "Cache populated");
                true
            }
            Err(err) => {
                self.store_failed("set", key, &err);
                false
            }
        }
    }

    // == Get ==
    /// Reads and decodes the value under `key`.
    ///
    /// Absent, expired, undecodable and unreachable all come back as `None`,
    /// and only a decoded value counts as a hit.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = match self.load(key).await {
            Some(raw) => match serde_json::from_str(&raw).map_err(CacheError::from) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(key, error = %err, "Discarding undecodable cache payload");
                    None
                }
            },
            None => None,
        };
        self.record_lookup(value.is_some());
        value
    }

    // == Set ==
    /// Encodes `value` as JSON and stores it for `ttl_secs`.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl_secs: u64) -> bool {
        match serde_json::to_string(value).map_err(CacheError::from) {
            Ok(json) => self.set_raw(key, &json, ttl_secs).await,
            Err(err) => {
                warn!(key, error = %err, "Value is not JSON-representable; not cached");
                false
            }
        }
    }

    // == Delete ==
    /// Removes a single key. Deleting an absent key succeeds.
    pub async fn delete(&self, key: &str) -> bool {
        match self.call(self.store.del(&[key.to_string()])).await {
            Ok(_) => true,
            Err(err) => {
                self.store_failed("delete", key, &err);
                false
            }
        }
    }

    // == Delete By Pattern ==
    /// Lists keys matching a glob and deletes them in one bulk call.
    ///
    /// Zero matches is `Ok(0)` and issues no delete. Keys written between
    /// the listing and the delete may survive until their TTL runs out.
    pub async fn delete_by_pattern(&self, pattern: &str) -> Result<usize> {
        let keys = match self.call(self.store.keys(pattern)).await {
            Ok(keys) => keys,
            Err(err) => {
                self.store_failed("keys", pattern, &err);
                return Err(err);
            }
        };
        if keys.is_empty() {
            debug!(pattern, "No cached keys matched");
            return Ok(0);
        }

        match self.call(self.store.del(&keys)).await {
            Ok(removed) => {
                self.metrics.record_invalidated(removed);
                Ok(removed)
            }
            Err(err) => {
                self.store_failed("del", pattern, &err);
                Err(err)
            }
        }
    }

    // == Read-Through ==
    /// Returns the cached value for `key`, or runs `fetch` and caches its
    /// successful result for `ttl_secs`.
    ///
    /// `fetch` errors pass through untouched and are never cached.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        key: &str,
        ttl_secs: u64,
        fetch: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(cached) = self.get(key).await {
            debug!(key, "Cache hit");
            return Ok(cached);
        }

        debug!(key, "Cache miss");
        let value = fetch().await?;
        self.set(key, &value, ttl_secs).await;
        Ok(value)
    }

    // == Expiry ==
    /// Refreshes the TTL of `key` without rewriting its value.
    ///
    /// Returns false if the key is gone or the store is unreachable.
    pub async fn expire(&self, key: &str, ttl_secs: u64) -> bool {
        match self.call(self.store.expire(key, ttl_secs)).await {
            Ok(applied) => applied,
            Err(err) => {
                self.store_failed("expire", key, &err);
                false
            }
        }
    }

    // == Health ==
    /// Round-trips a `PING` to the store.
    pub async fn ping(&self) -> Result<()> {
        self.call(self.store.ping()).await
    }

    pub fn backend(&self) -> &'static str {
        self.store.name()
    }

    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot()
    }

    /// Closes the underlying store. Called once at shutdown.
    pub async fn close(&self) {
        self.store.close().await;
    }
}

/// True if `text` parses as a JSON document.
pub(crate) fn is_json_text(text: &str) -> bool {
    serde_json::from_str::<IgnoredAny>(text).is_ok()
}
