//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache layer.
///
/// Store-facing variants never reach the end user of a cached route; the
/// cache manager converts them into misses or failed writes. They surface
/// only through the admin endpoints and the logs.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Connection refused, broken pipe, store closed
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Store call exceeded the operation timeout
    #[error("Store operation timed out after {0} ms")]
    Timeout(u64),

    /// Value could not be encoded, or a stored payload could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid cache policy at route registration
    #[error("Invalid cache policy: {0}")]
    Policy(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown resource or key
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::StoreUnavailable(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::StoreUnavailable(_) | CacheError::Timeout(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::Serialization(_) | CacheError::Policy(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
