//! Read-Through Middleware
//!
//! On a hit the cached JSON is returned without running the handler. On a
//! miss the handler runs and, if it answered `200 OK` with a bare
//! `application/json` body, that body is stored under the derived key before
//! the response leaves.

use std::sync::Arc;

use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::cache::{is_json_text, CacheManager, CachePolicy};

/// Response header reporting `HIT` or `MISS`. Informational only.
pub const X_CACHE: &str = "x-cache";

/// Largest body buffered for caching unless configured otherwise.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

// == Read Through ==
/// Middleware state for one cached route.
#[derive(Clone)]
pub struct ReadThrough {
    cache: CacheManager,
    policy: Arc<CachePolicy>,
    max_body_bytes: usize,
}

impl ReadThrough {
    pub fn new(cache: CacheManager, policy: CachePolicy) -> Self {
        Self {
            cache,
            policy: Arc::new(policy),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Bodies larger than `limit`, or of unknown length, pass through uncached.
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Stores a successful JSON response and hands it back rebuilt.
    async fn populate(&self, key: &str, response: Response) -> Response {
        if response.status() != StatusCode::OK || !is_plain_json(response.headers()) {
            return response;
        }

        let (mut parts, body) = response.into_parts();
        let within_limit = body
            .size_hint()
            .exact()
            .is_some_and(|len| len <= self.max_body_bytes as u64);
        if !within_limit {
            debug!(key, "Body too large or streamed; not cached");
            return Response::from_parts(parts, body);
        }

        let bytes = match axum::body::to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(err) => {
                // The size hint already passed, so only a body stream error
                // lands here. The body is partly consumed and cannot be sent.
                warn!(key, error = %err, "Handler body stream failed while buffering");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        match std::str::from_utf8(&bytes).ok().filter(|text| is_json_text(text)) {
            Some(text) => {
                self.cache.set_raw(key, text, self.policy.ttl_secs()).await;
            }
            None => warn!(key, "Handler declared JSON but body did not parse; not cached"),
        }

        parts
            .headers
            .insert(X_CACHE, HeaderValue::from_static("MISS"));
        Response::from_parts(parts, Body::from(bytes))
    }
}

/// Cache-aside wrapper for idempotent JSON routes.
///
/// Only `GET` is considered. Requests the policy cannot key (no principal on
/// a per-principal route, malformed query) go straight to the handler.
pub async fn read_through(
    State(layer): State<ReadThrough>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let Some(key) = layer.policy.derive_key(&request) else {
        debug!(path = %request.uri().path(), "No cache key for request; bypassing");
        return next.run(request).await;
    };

    if let Some(body) = layer.cache.get_raw(&key).await {
        debug!(key = %key, "Cache hit");
        return hit_response(body);
    }
    debug!(key = %key, "Cache miss");

    let response = next.run(request).await;
    layer.populate(&key, response).await
}

fn hit_response(body: String) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(X_CACHE, HeaderValue::from_static("HIT"));
    response
}

/// True only for a bare `application/json` content type, the one header a
/// hit reproduces. Parameters and `+json` subtypes are not cached.
fn is_plain_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim().eq_ignore_ascii_case("application/json"))
}
