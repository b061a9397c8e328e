//! Router tests that need no database.
//!
//! Everything here is decided by routing, extraction, authorization or
//! configuration before the first query runs.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use bloom_integration_tests::{get, json, offline_app, send};
use serde_json::json as body;

#[tokio::test]
async fn test_health() {
    let app = offline_app();
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let app = offline_app();
    let (status, _) = send(&app, get("/health/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let app = offline_app();
    let response = tower::ServiceExt::oneshot(app, get("/health")).await.unwrap();
    let headers = response.headers();
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(headers["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_admin_routes_require_login() {
    let app = offline_app();
    for path in [
        "/api/admin/products",
        "/api/admin/orders",
        "/api/admin/settings",
        "/api/admin/reports",
    ] {
        let (status, body) = send(&app, get(path)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(body["message"], "Login required");
    }
}

#[tokio::test]
async fn test_me_requires_login() {
    let app = offline_app();
    let (status, _) = send(&app, get("/api/auth/me")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = offline_app();
    let request = axum::http::Request::post("/api/orders")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_invalid_cart_session_is_bad_request() {
    let app = offline_app();
    let (status, _) = send(&app, get("/api/cart/not%20valid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_numeric_product_id_is_bad_request() {
    let app = offline_app();
    let (status, body) = send(&app, get("/api/products/roses")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_assistant_unavailable_without_api_key() {
    let app = offline_app();
    let turn = body!({ "message": "What goes well with tulips?" });
    let (status, body) = send(&app, json("POST", "/api/ai/chat", &turn)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "The assistant is not configured");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = offline_app();
    let (status, _) = send(&app, get("/api/flowers")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
