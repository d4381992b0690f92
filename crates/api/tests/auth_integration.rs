//! Integration tests for bearer authentication, rate limiting and the
//! operational endpoints.
//!
//! Run with: cargo test --test auth_integration

mod common;

use axum::http::{header, StatusCode};
use common::{get_request, get_request_with_auth, parse_response_body, test_config, TestApp};
use shared::jwt::{JwtConfig, Role};
use uuid::Uuid;

#[tokio::test]
async fn test_missing_token_unauthorized() {
    let app = TestApp::new();

    let response = app.send(get_request("/api/v1/forms")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_garbage_token_unauthorized() {
    let app = TestApp::new();

    let response = app
        .send(get_request_with_auth("/api/v1/forms", "not.a.jwt"))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_unauthorized() {
    let app = TestApp::new();
    let foreign = JwtConfig::from_secret("another-secret-that-is-also-long-enough", 3600, 0)
        .unwrap()
        .generate_access_token(Uuid::new_v4(), Role::Admin)
        .unwrap()
        .0;

    let response = app
        .send(get_request_with_auth("/api/v1/admin/settings", &foreign))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_unauthorized() {
    let app = TestApp::new();
    let expired = JwtConfig::from_secret(common::TEST_JWT_SECRET, -3600, 0)
        .unwrap()
        .generate_access_token(Uuid::new_v4(), Role::User)
        .unwrap()
        .0;

    let response = app
        .send(get_request_with_auth("/api/v1/forms", &expired))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_token_accepted() {
    let app = TestApp::new();
    let token = app.user_token(Uuid::new_v4());

    let response = app.send(get_request_with_auth("/api/v1/forms", &token)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["forms"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_rate_limit_returns_retry_after() {
    let mut config = test_config();
    config.security.rate_limit_per_minute = 2;
    let app = TestApp::with_config(config);
    let token = app.user_token(Uuid::new_v4());

    for _ in 0..2 {
        let response = app.send(get_request_with_auth("/api/v1/forms", &token)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.send(get_request_with_auth("/api/v1/forms", &token)).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "rate_limited");

    // Limits are per user
    let other = app.user_token(Uuid::new_v4());
    let response = app.send(get_request_with_auth("/api/v1/forms", &other)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let response = app.send(get_request("/api/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["connected"], true);
}

#[tokio::test]
async fn test_health_check_reports_storage_outage() {
    let app = TestApp::new();
    app.store.set_offline(true);

    let response = app.send(get_request("/api/health/ready")).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_liveness_ignores_storage() {
    let app = TestApp::new();
    app.store.set_offline(true);

    let response = app.send(get_request("/api/health/live")).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_storage_errors_hide_details() {
    let app = TestApp::new();
    let token = app.user_token(Uuid::new_v4());
    app.store.set_offline(true);

    let response = app.send(get_request_with_auth("/api/v1/forms", &token)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "internal_error");
    assert_eq!(body["message"], "An internal error occurred");
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let app = TestApp::new();

    let response = app.send(get_request("/api/health/live")).await;

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.contains_key("x-request-id"));
    assert!(!headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
}
