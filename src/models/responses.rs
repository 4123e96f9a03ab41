//! Response DTOs for the cache admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::CacheStats;
use crate::middleware::InvalidationReport;

/// Response body for single-key removal (DELETE /cache/keys/*key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' removed", key),
            key,
        }
    }
}

/// Response body for invalidation endpoints (POST /cache/invalidate...)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub message: String,
    pub removed: usize,
    pub failed: Vec<String>,
}

impl From<InvalidationReport> for InvalidateResponse {
    fn from(report: InvalidationReport) -> Self {
        let message = if report.is_complete() {
            format!("{} cached keys invalidated", report.removed)
        } else {
            format!(
                "{} cached keys invalidated, {} patterns failed",
                report.removed,
                report.failed.len()
            )
        };
        Self {
            message,
            removed: report.removed,
            failed: report.failed,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub backend: String,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub store_errors: u64,
    pub invalidated_keys: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics
    pub fn new(backend: impl Into<String>, stats: &CacheStats) -> Self {
        Self {
            backend: backend.into(),
            hits: stats.hits,
            misses: stats.misses,
            sets: stats.sets,
            store_errors: stats.store_errors,
            invalidated_keys: stats.invalidated_keys,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Per-dependency state
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub services: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthResponse {
    /// Creates a healthy response with the store reported as connected
    pub fn healthy(backend: &str) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            services: BTreeMap::from([(backend.to_string(), "connected".to_string())]),
            error: None,
        }
    }

    /// Creates an unhealthy response carrying the failure
    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: "unhealthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            services: BTreeMap::new(),
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_response_serialize() {
        let resp = DeleteResponse::new("clientes_list:/admin/clientes:{}");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("clientes_list"));
        assert!(json.contains("removed"));
    }

    #[test]
    fn test_invalidate_response_from_report() {
        let resp = InvalidateResponse::from(InvalidationReport {
            removed: 4,
            failed: vec![],
        });
        assert_eq!(resp.message, "4 cached keys invalidated");

        let resp = InvalidateResponse::from(InvalidationReport {
            removed: 1,
            failed: vec!["dashboard_*".to_string()],
        });
        assert!(resp.message.contains("1 patterns failed"));
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..CacheStats::default()
        };
        let resp = StatsResponse::new("memory", &stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.backend, "memory");
    }

    #[test]
    fn test_health_response_serialize() {
        let json = serde_json::to_value(HealthResponse::healthy("redis")).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["services"]["redis"], "connected");
        assert!(json.get("timestamp").is_some());
        assert!(json.get("error").is_none());

        let json = serde_json::to_value(HealthResponse::unhealthy("connection refused")).unwrap();
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["error"], "connection refused");
        assert!(json.get("services").is_none());
    }
}
