//! In-Process Store
//!
//! HashMap-backed `KvStore` with per-entry expiry. Used when no Redis server
//! is configured and throughout the test suite; the availability switch lets
//! tests simulate a store outage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheEntry, KeyPattern, KvStore};
use crate::error::{CacheError, Result};

// == Memory Store ==
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulates the store going down (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::StoreUnavailable(
                "memory store is offline".to_string(),
            ))
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }

    /// Number of stored entries, expired ones included until swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Remaining TTL of a live key in milliseconds.
    pub async fn ttl_remaining_ms(&self, key: &str) -> Option<u64> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(CacheEntry::ttl_remaining_ms)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.ensure_available()?;
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        self.ensure_available()?;
        if ttl_secs == 0 {
            return Err(CacheError::InvalidRequest(
                "invalid expire time in 'setex' command".to_string(),
            ));
        }
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), CacheEntry::new(value.to_string(), ttl_secs));
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<usize> {
        self.ensure_available()?;
        let mut entries = self.entries.write().await;
        let removed = keys
            .iter()
            .filter_map(|key| entries.remove(key))
            .filter(|entry| !entry.is_expired())
            .count();
        Ok(removed)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.ensure_available()?;
        let pattern = KeyPattern::parse(pattern)?;
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired() && pattern.matches(key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool> {
        self.ensure_available()?;
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired() => {
                entry.renew(ttl_secs);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ping(&self) -> Result<()> {
        self.ensure_available()
    }

    async fn close(&self) {
        self.set_available(false);
        self.entries.write().await.clear();
    }
}
