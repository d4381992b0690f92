//! JWT authentication and admin role middleware.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Rejects requests without a valid bearer token.
///
/// The verified identity is stored in request extensions for the rate
/// limiter and the handlers.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match UserAuth::from_headers(&state.jwt, req.headers()) {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

/// Rejects callers whose token does not carry the admin role.
///
/// Must run after [`require_user_auth`].
pub async fn require_admin(req: Request<Body>, next: Next) -> Response {
    match req.extensions().get::<UserAuth>() {
        Some(auth) if auth.is_admin() => next.run(req).await,
        Some(auth) => {
            tracing::warn!(user_id = %auth.user_id, "Non-admin attempted admin access");
            ApiError::Forbidden("Admin role required".to_string()).into_response()
        }
        None => ApiError::Unauthorized("Authentication required".to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use shared::jwt::Role;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app(auth: Option<UserAuth>) -> Router {
        Router::new()
            .route("/admin", get(|| async { "ok" }))
            .route_layer(axum::middleware::from_fn(require_admin))
            .layer(axum::middleware::from_fn(
                move |mut req: Request<Body>, next: Next| {
                    let auth = auth.clone();
                    async move {
                        if let Some(auth) = auth {
                            req.extensions_mut().insert(auth);
                        }
                        next.run(req).await
                    }
                },
            ))
    }

    fn auth(role: Role) -> UserAuth {
        UserAuth {
            user_id: Uuid::new_v4(),
            jti: "jti".to_string(),
            role,
        }
    }

    async fn status(auth: Option<UserAuth>) -> StatusCode {
        let request = Request::builder().uri("/admin").body(Body::empty()).unwrap();
        app(auth).oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_require_admin_allows_admin() {
        assert_eq!(status(Some(auth(Role::Admin))).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_require_admin_rejects_user() {
        assert_eq!(status(Some(auth(Role::User))).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_require_admin_without_auth() {
        assert_eq!(status(None).await, StatusCode::UNAUTHORIZED);
    }
}
