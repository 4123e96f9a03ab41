//! Redis Store
//!
//! `KvStore` over a single shared, auto-reconnecting Redis connection.
//! Commands are issued explicitly so the wire traffic is exactly
//! `GET`, `SETEX`, `DEL`, `KEYS`, `EXPIRE` and `PING`.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::IntoConnectionInfo;
use tracing::info;

use super::KvStore;
use crate::config::RedisConfig;
use crate::error::{CacheError, Result};

// == Redis Store ==
/// Process-wide Redis handle.
///
/// Opened once by the composition root and shared by reference; the
/// multiplexed connection pipelines independent commands, so concurrent
/// requests never need their own connection.
pub struct RedisStore {
    conn: ConnectionManager,
    closed: AtomicBool,
}

impl RedisStore {
    /// Connects to the configured server, bounded by the connect timeout.
    pub async fn open(config: &RedisConfig) -> Result<Self> {
        let mut info = config.base_url().into_connection_info()?;
        if config.password.is_some() {
            info.redis.password = config.password.clone();
        }
        let db = info.redis.db;

        let client = redis::Client::open(info)?;
        let conn = tokio::time::timeout(config.connect_timeout(), ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Timeout(config.connect_timeout_ms))??;

        info!(host = %config.host, port = config.port, db, "Connected to Redis");

        Ok(Self {
            conn,
            closed: AtomicBool::new(false),
        })
    }

    fn connection(&self) -> Result<ConnectionManager> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CacheError::StoreUnavailable(
                "redis connection closed".to_string(),
            ));
        }
        Ok(self.conn.clone())
    }
}

#[async_trait]
impl KvStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection()?;
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.connection()?;
        let _: () = redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_secs)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection()?;
        let removed: usize = redis::cmd("DEL").arg(keys).query_async(&mut conn).await?;
        Ok(removed)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.connection()?;
        let keys: Vec<String> = redis::cmd("KEYS").arg(pattern).query_async(&mut conn).await?;
        Ok(keys)
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool> {
        let mut conn = self.connection()?;
        let applied: bool = redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await?;
        Ok(applied)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection()?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("Redis connection closed");
        }
    }
}
