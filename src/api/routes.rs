//! API Routes
//!
//! Configures the Axum router with the cache service endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_key_handler, health_handler, invalidate_handler, invalidate_resource_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/cache/keys/*key", delete(delete_key_handler))
        .route("/cache/invalidate", post(invalidate_handler))
        .route("/cache/invalidate/:resource", post(invalidate_resource_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheManager;
    use crate::store::MemoryStore;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn create_test_app() -> (CacheManager, Router) {
        let store = Arc::new(MemoryStore::new());
        let cache = CacheManager::new(store, Duration::from_millis(500));
        (cache.clone(), create_router(AppState::new(cache)))
    }

    #[tokio::test]
    async fn test_health_route() {
        let (_, app) = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_key_wildcard_keeps_slashes() {
        let (cache, app) = create_test_app();
        cache.set_raw("clientes_list:/admin/clientes", "{}", 60).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/cache/keys/clientes_list:/admin/clientes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(cache.get_raw("clientes_list:/admin/clientes").await.is_none());
    }

    #[tokio::test]
    async fn test_wrong_method_rejected() {
        let (_, app) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/cache/invalidate")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_cors_headers_present() {
        let (_, app) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/stats")
                    .header(header::ORIGIN, "http://painel.local")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
