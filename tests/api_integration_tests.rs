//! Integration Tests for the Admin Endpoints
//!
//! Tests the full request/response cycle of the cache service router.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use panel_cache::{api::create_router, store::MemoryStore, AppState, CacheManager};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> (Arc<MemoryStore>, CacheManager, Router) {
    let store = Arc::new(MemoryStore::new());
    let cache = CacheManager::new(store.clone(), Duration::from_millis(500));
    let app = create_router(AppState::new(cache.clone()));
    (store, cache, app)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn seed(cache: &CacheManager, keys: &[&str]) {
    for key in keys {
        assert!(cache.set_raw(key, r#"{"ok":true}"#, 300).await);
    }
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint_healthy() {
    let (_, _, app) = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["services"]["memory"], "connected");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_endpoint_store_down() {
    let (store, _, app) = create_test_app();
    store.set_available(false);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "unhealthy");
    assert!(json["error"].is_string());
}

// == Stats Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint_counts_hits_and_misses() {
    let (_, cache, app) = create_test_app();
    seed(&cache, &["clientes_list:a"]).await;
    cache.get_raw("clientes_list:a").await;
    cache.get_raw("clientes_list:b").await;

    let response = app
        .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["backend"], "memory");
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["sets"], 1);
    assert_eq!(json["hit_rate"], 0.5);
}

// == Delete Endpoint Tests ==

#[tokio::test]
async fn test_delete_key_endpoint() {
    let (_, cache, app) = create_test_app();
    seed(&cache, &["session:abc"]).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/cache/keys/session:abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "session:abc");
    assert!(cache.get_raw("session:abc").await.is_none());
}

#[tokio::test]
async fn test_delete_absent_key_is_idempotent() {
    let (_, _, app) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/cache/keys/never_set")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_key_store_down() {
    let (store, _, app) = create_test_app();
    store.set_available(false);

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/cache/keys/session:abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].is_string());
}

// == Invalidate Endpoint Tests ==

#[tokio::test]
async fn test_invalidate_patterns() {
    let (_, cache, app) = create_test_app();
    seed(
        &cache,
        &["agendamentos_list:1", "agendamentos_list:2", "clientes_list:1"],
    )
    .await;

    let response = app
        .oneshot(post_json(
            "/cache/invalidate",
            r#"{"patterns":["agendamentos_*"]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], 2);
    assert_eq!(json["failed"].as_array().unwrap().len(), 0);

    assert!(cache.get_raw("agendamentos_list:1").await.is_none());
    assert!(cache.get_raw("clientes_list:1").await.is_some());
}

#[tokio::test]
async fn test_invalidate_no_matches() {
    let (_, _, app) = create_test_app();

    let response = app
        .oneshot(post_json("/cache/invalidate", r#"{"patterns":["midias_*"]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], 0);
}

#[tokio::test]
async fn test_invalidate_rejects_empty_patterns() {
    let (_, _, app) = create_test_app();

    let response = app
        .oneshot(post_json("/cache/invalidate", r#"{"patterns":[]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_invalidate_rejects_malformed_body() {
    let (_, _, app) = create_test_app();

    let response = app
        .oneshot(post_json("/cache/invalidate", r#"{"pattern":"x"}"#))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_invalidate_reports_failures_when_store_down() {
    let (store, cache, app) = create_test_app();
    seed(&cache, &["clientes_list:1"]).await;
    store.set_available(false);

    let response = app
        .oneshot(post_json(
            "/cache/invalidate",
            r#"{"patterns":["clientes_*","dashboard_*"]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], 0);
    assert_eq!(json["failed"], serde_json::json!(["clientes_*", "dashboard_*"]));
}

// == Resource Invalidation Tests ==

#[tokio::test]
async fn test_invalidate_resource_applies_table() {
    let (_, cache, app) = create_test_app();
    seed(
        &cache,
        &[
            "clientes_list:1",
            "agendamentos_list:1",
            "dashboard_totals",
            "midias_list:1",
        ],
    )
    .await;

    let response = app
        .oneshot(post_json("/cache/invalidate/clientes", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], 3);

    assert!(cache.get_raw("clientes_list:1").await.is_none());
    assert!(cache.get_raw("agendamentos_list:1").await.is_none());
    assert!(cache.get_raw("dashboard_totals").await.is_none());
    assert!(cache.get_raw("midias_list:1").await.is_some());
}

#[tokio::test]
async fn test_invalidate_unknown_resource() {
    let (_, _, app) = create_test_app();

    let response = app
        .oneshot(post_json("/cache/invalidate/unknown", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == Error Handling Tests ==

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let (_, _, app) = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
