//! Configuration Module
//!
//! Handles loading the store connection settings and the TTL policy from
//! environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::TtlPolicy;

/// Which key-value store backs the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// External Redis server
    Redis,
    /// In-process store, for development and tests
    Memory,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(Backend::Redis),
            "memory" => Ok(Backend::Memory),
            other => Err(format!("unknown cache backend '{}'", other)),
        }
    }
}

/// Connection settings for the Redis backend.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Full connection URL; when set it wins over host/port/db
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    /// Logical database index
    pub db: i64,
    /// Upper bound for the initial connect
    pub connect_timeout_ms: u64,
}

impl RedisConfig {
    /// Connection URL without credentials; the password is applied to the
    /// parsed connection info so it never needs URL escaping.
    pub fn base_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            db: 0,
            connect_timeout_ms: 2000,
        }
    }
}

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub redis: RedisConfig,
    /// Default TTLs per cache category
    pub ttl: TtlPolicy,
    /// Upper bound for a single store call before it counts as a failure
    pub op_timeout_ms: u64,
    /// Largest response body the read-through layer will buffer and store
    pub max_body_bytes: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Memory backend sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BACKEND` - `redis` or `memory` (default: redis)
    /// - `REDIS_URL` - Full connection URL (optional)
    /// - `REDIS_HOST` / `REDIS_PORT` / `REDIS_PASSWORD` / `REDIS_DB`
    /// - `REDIS_CONNECT_TIMEOUT_MS` - Initial connect bound (default: 2000)
    /// - `CACHE_TTL_LIST` - List caches in seconds (default: 300)
    /// - `CACHE_TTL_FORM` - Form reference data in seconds (default: 600)
    /// - `CACHE_TTL_DASHBOARD` - Dashboard aggregates in seconds (default: 600)
    /// - `SESSION_TTL` - Session entries in seconds (default: 86400)
    /// - `CACHE_OP_TIMEOUT_MS` - Per-operation store timeout (default: 500)
    /// - `CACHE_MAX_BODY_BYTES` - Largest cacheable body (default: 1 MiB)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Memory backend sweep in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            backend: env_or("CACHE_BACKEND", defaults.backend),
            redis: RedisConfig {
                url: env::var("REDIS_URL").ok().filter(|v| !v.is_empty()),
                host: env_or("REDIS_HOST", defaults.redis.host),
                port: env_or("REDIS_PORT", defaults.redis.port),
                password: env::var("REDIS_PASSWORD").ok().filter(|v| !v.is_empty()),
                db: env_or("REDIS_DB", defaults.redis.db),
                connect_timeout_ms: env_or(
                    "REDIS_CONNECT_TIMEOUT_MS",
                    defaults.redis.connect_timeout_ms,
                ),
            },
            ttl: TtlPolicy {
                list: env_or("CACHE_TTL_LIST", defaults.ttl.list),
                form_data: env_or("CACHE_TTL_FORM", defaults.ttl.form_data),
                dashboard: env_or("CACHE_TTL_DASHBOARD", defaults.ttl.dashboard),
                session: env_or("SESSION_TTL", defaults.ttl.session),
            },
            op_timeout_ms: env_or("CACHE_OP_TIMEOUT_MS", defaults.op_timeout_ms),
            max_body_bytes: env_or("CACHE_MAX_BODY_BYTES", defaults.max_body_bytes),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Redis,
            redis: RedisConfig::default(),
            ttl: TtlPolicy::default(),
            op_timeout_ms: 500,
            max_body_bytes: 1024 * 1024,
            server_port: 3000,
            cleanup_interval: 1,
        }
    }
}

/// Parses an env var, falling back to `default` when unset or malformed.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.backend, Backend::Redis);
        assert_eq!(config.redis.port, 6379);
        assert_eq!(config.redis.db, 0);
        assert_eq!(config.ttl.list, 300);
        assert_eq!(config.ttl.form_data, 600);
        assert_eq!(config.ttl.dashboard, 600);
        assert_eq!(config.ttl.session, 86400);
        assert_eq!(config.op_timeout_ms, 500);
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_config_from_env_defaults() {
        for name in [
            "CACHE_BACKEND",
            "REDIS_URL",
            "REDIS_HOST",
            "REDIS_PORT",
            "REDIS_PASSWORD",
            "REDIS_DB",
            "CACHE_TTL_LIST",
            "CACHE_TTL_FORM",
            "CACHE_TTL_DASHBOARD",
            "SESSION_TTL",
            "CACHE_OP_TIMEOUT_MS",
            "SERVER_PORT",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.backend, Backend::Redis);
        assert_eq!(config.redis.host, "localhost");
        assert!(config.redis.password.is_none());
        assert_eq!(config.ttl.list, 300);
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("memory".parse::<Backend>(), Ok(Backend::Memory));
        assert_eq!("REDIS".parse::<Backend>(), Ok(Backend::Redis));
        assert!("memcached".parse::<Backend>().is_err());
    }

    #[test]
    fn test_base_url() {
        let mut redis = RedisConfig {
            host: "cache.internal".to_string(),
            port: 6380,
            db: 2,
            ..RedisConfig::default()
        };
        assert_eq!(redis.base_url(), "redis://cache.internal:6380/2");

        redis.url = Some("redis://other:6379/5".to_string());
        assert_eq!(redis.base_url(), "redis://other:6379/5");
    }
}
