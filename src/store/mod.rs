//! Store Module
//!
//! The key-value store the cache sits on. `KvStore` is the seam between the
//! cache manager and a concrete backend: Redis in production, an in-process
//! map for development and tests.

mod entry;
mod memory;
mod pattern;
mod redis;

use async_trait::async_trait;

use crate::error::Result;

pub use entry::{current_timestamp_ms, CacheEntry};
pub use memory::MemoryStore;
pub use pattern::{glob_match, is_glob, KeyPattern};
pub use self::redis::RedisStore;

// == Store Trait ==
/// Primitive operations the cache layer needs from a key-value store.
///
/// Implementations report failures as `CacheError::StoreUnavailable`; the
/// cache manager decides how to degrade.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Short backend name for health output and logs.
    fn name(&self) -> &'static str;

    /// `GET key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// `SETEX key ttl value`
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    /// `DEL key1 key2 ...`, returns how many keys existed.
    async fn del(&self, keys: &[String]) -> Result<usize>;

    /// `KEYS pattern`
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// `EXPIRE key ttl`, returns false when the key does not exist.
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool>;

    /// `PING`
    async fn ping(&self) -> Result<()>;

    /// Releases the connection. Later calls fail as unavailable.
    async fn close(&self);
}
