//! Common test utilities for integration tests.
//!
//! The application is wired over the in-memory repositories and a fixed
//! clock, so tests run without PostgreSQL and can move time forward.

// Not every integration test uses every helper.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use domain::repository::memory::InMemoryStore;
use domain::services::FixedClock;
use fake::{
    faker::{internet::en::SafeEmail, lorem::en::Sentence},
    Fake,
};
use formlink_api::app::create_app_with_repositories;
use formlink_api::config::{
    Config, DatabaseConfig, JobsConfig, JwtAuthConfig, LoggingConfig, PaymentsConfig,
    SecurityConfig, ServerConfig,
};
use shared::jwt::{JwtConfig, Role};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "formlink-integration-test-secret-0123456789";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_integration_test";
pub const TEST_PUBLIC_BASE_URL: &str = "http://localhost:3000";

/// Test configuration with an HS256 secret and rate limiting disabled.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
            max_body_size: 1_048_576,
            public_base_url: TEST_PUBLIC_BASE_URL.to_string(),
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 5,
            idle_timeout_secs: 60,
        },
        logging: LoggingConfig {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            cors_origins: Vec::new(),
            rate_limit_per_minute: 0,
            subscriber_rate_limit_per_minute: 0,
            hsts_enabled: false,
        },
        jwt: JwtAuthConfig {
            secret: TEST_JWT_SECRET.to_string(),
            public_key: String::new(),
            access_token_expiry_secs: 3600,
            leeway_secs: 30,
        },
        payments: PaymentsConfig {
            webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
            plan_amount_minor: 500_000,
            currency: "NGN".to_string(),
            plan_duration_days: 30,
        },
        jobs: JobsConfig::default(),
    }
}

/// Mid-day instant the test clock starts at.
pub fn test_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
}

/// Random short form title.
pub fn fake_title() -> String {
    Sentence(2..5).fake()
}

/// Random submission payload.
pub fn fake_submission() -> serde_json::Value {
    let email: String = SafeEmail().fake();
    serde_json::json!({ "data": { "email": email, "comment": fake_title() } })
}

/// Router plus handles on its store and clock.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<FixedClock>,
    jwt: JwtConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let jwt = config.jwt.build().expect("Failed to build JWT config");
        let store = InMemoryStore::new();
        let clock = Arc::new(FixedClock::new(test_start()));
        let router = create_app_with_repositories(config, store.repositories(), clock.clone())
            .expect("Failed to build test app");

        Self {
            router,
            store,
            clock,
            jwt,
        }
    }

    pub fn token_for(&self, user_id: Uuid, role: Role) -> String {
        self.jwt
            .generate_access_token(user_id, role)
            .expect("Failed to sign test token")
            .0
    }

    pub fn user_token(&self, user_id: Uuid) -> String {
        self.token_for(user_id, Role::User)
    }

    pub fn admin_token(&self) -> String {
        self.token_for(Uuid::new_v4(), Role::Admin)
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Creates a form titled `title` and returns the response body.
    pub async fn create_form(&self, token: &str, title: &str) -> serde_json::Value {
        let response = self
            .send(json_request_with_auth(
                Method::POST,
                "/api/v1/forms",
                serde_json::json!({ "title": title }),
                token,
            ))
            .await;
        assert_eq!(response.status(), axum::http::StatusCode::CREATED);
        parse_response_body(response).await
    }

    /// Replaces the global policy through the admin endpoint.
    pub async fn set_policy(&self, policy: serde_json::Value) -> serde_json::Value {
        let response = self
            .send(json_request_with_auth(
                Method::PUT,
                "/api/v1/admin/settings",
                policy,
                &self.admin_token(),
            ))
            .await;
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        parse_response_body(response).await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a JSON request with no authentication.
pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a JSON request with authentication.
pub fn json_request_with_auth(
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a GET request with no authentication.
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Build a GET request with authentication.
pub fn get_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Build a DELETE request with authentication.
pub fn delete_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Build a payment webhook request signed with `secret`.
pub fn signed_webhook_request(body: &serde_json::Value, secret: &str) -> Request<Body> {
    let payload = serde_json::to_vec(body).unwrap();
    let signature = shared::crypto::hmac_sha512_hex(secret, &payload).unwrap();

    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/payments/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .header(formlink_api::routes::payments::SIGNATURE_HEADER, signature)
        .body(Body::from(payload))
        .unwrap()
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}
