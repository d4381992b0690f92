use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::repository::Repositories;
use domain::services::{Clock, FormService, PolicyEngine, SubscriptionService};
use shared::jwt::JwtConfig;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{Config, ConfigValidationError};
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_admin, require_user_auth,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{admin_settings, forms, health, payments, public_forms, subscriptions};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: PolicyEngine,
    pub forms: FormService,
    pub subscriptions: SubscriptionService,
    pub jwt: Arc<JwtConfig>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    /// Wires the policy engine and services over `repos`.
    pub fn new(
        config: Config,
        repos: Repositories,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigValidationError> {
        let jwt = config
            .jwt
            .build()
            .map_err(|e| ConfigValidationError::InvalidValue(format!("jwt: {}", e)))?;

        // Rate limiting is disabled when rate_limit_per_minute is 0
        let rate_limiter = (config.security.rate_limit_per_minute > 0).then(|| {
            Arc::new(RateLimiterState::new(
                config.security.rate_limit_per_minute,
                config.security.subscriber_rate_limit_per_minute,
            ))
        });

        let engine = PolicyEngine::new(repos, clock);
        let forms = FormService::new(engine.clone());
        let subscriptions = SubscriptionService::new(engine.clone(), config.payments.plan_terms());

        Ok(Self {
            config: Arc::new(config),
            engine,
            forms,
            subscriptions,
            jwt: Arc::new(jwt),
            rate_limiter,
        })
    }
}

/// Builds the application over any repository set and clock.
pub fn create_app_with_repositories(
    config: Config,
    repos: Repositories,
    clock: Arc<dyn Clock>,
) -> Result<Router, ConfigValidationError> {
    AppState::new(config, repos, clock).map(router)
}

pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Authenticated user routes.
    // Middleware order: auth runs first, then rate limiting (which needs the identity)
    let user_routes = Router::new()
        .route("/api/v1/forms", post(forms::create_form).get(forms::list_forms))
        .route("/api/v1/forms/quota", get(forms::get_quota))
        .route(
            "/api/v1/forms/:form_id",
            get(forms::get_form)
                .put(forms::update_form)
                .delete(forms::delete_form),
        )
        .route(
            "/api/v1/forms/:form_id/submissions",
            get(forms::list_submissions),
        )
        .route(
            "/api/v1/subscriptions",
            post(subscriptions::initiate_subscription),
        )
        .route(
            "/api/v1/subscriptions/current",
            get(subscriptions::current_subscription),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // Admin routes: auth, then role check, then rate limiting
    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/settings",
            get(admin_settings::get_settings).put(admin_settings::update_settings),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // Share-link routes, reachable by anyone holding the link
    let public_routes = Router::new()
        .route(
            "/api/v1/public/forms/:form_id",
            get(public_forms::get_public_form),
        )
        .route(
            "/api/v1/public/forms/:form_id/submissions",
            post(public_forms::submit_form),
        )
        .route("/api/v1/payments/webhook", post(payments::payment_webhook));

    let ops_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(ops_routes)
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(config.server.max_body_size))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
