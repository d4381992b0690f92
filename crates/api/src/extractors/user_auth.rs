//! Bearer token authentication extractor.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use shared::jwt::{JwtConfig, JwtError, Role};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Caller identity taken from a verified JWT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAuth {
    /// User ID from the JWT subject claim.
    pub user_id: Uuid,
    /// JWT ID (jti), logged for session tracing.
    pub jti: String,
    pub role: Role,
}

impl UserAuth {
    /// Verifies `token` and reads the caller's identity from its claims.
    pub fn validate(jwt_config: &JwtConfig, token: &str) -> Result<Self, JwtError> {
        let claims = jwt_config.validate_access_token(token)?;
        let user_id = shared::jwt::extract_user_id(&claims)?;

        Ok(UserAuth {
            user_id,
            jti: claims.jti,
            role: claims.role,
        })
    }

    /// Authenticates from the `Authorization: Bearer` header.
    pub fn from_headers(jwt_config: &JwtConfig, headers: &HeaderMap) -> Result<Self, ApiError> {
        let bearer = headers
            .typed_get::<Authorization<Bearer>>()
            .ok_or_else(|| {
                ApiError::Unauthorized("Missing or invalid Authorization header".to_string())
            })?;

        Self::validate(jwt_config, bearer.token()).map_err(|e| {
            tracing::debug!(error = %e, "JWT validation failed");
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already verified by the auth middleware on protected routes
        if let Some(auth) = parts.extensions.get::<UserAuth>() {
            return Ok(auth.clone());
        }

        UserAuth::from_headers(&state.jwt, &parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    fn jwt() -> JwtConfig {
        JwtConfig::from_secret(SECRET, 3600, 30).unwrap()
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_validate_reads_subject_and_role() {
        let config = jwt();
        let user_id = Uuid::new_v4();
        let (token, jti) = config.generate_access_token(user_id, Role::Admin).unwrap();

        let auth = UserAuth::validate(&config, &token).unwrap();
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.jti, jti);
        assert!(auth.is_admin());
    }

    #[test]
    fn test_from_headers_accepts_bearer() {
        let config = jwt();
        let user_id = Uuid::new_v4();
        let (token, _) = config.generate_access_token(user_id, Role::User).unwrap();

        let auth =
            UserAuth::from_headers(&config, &headers_with(&format!("Bearer {}", token))).unwrap();
        assert_eq!(auth.user_id, user_id);
        assert!(!auth.is_admin());
    }

    #[test]
    fn test_from_headers_missing_header() {
        let result = UserAuth::from_headers(&jwt(), &HeaderMap::new());
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_from_headers_wrong_scheme() {
        let result = UserAuth::from_headers(&jwt(), &headers_with("Basic dXNlcjpwYXNz"));
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_from_headers_token_from_other_issuer() {
        let other = JwtConfig::from_secret("another-secret-that-is-long-enough-too", 3600, 30)
            .unwrap();
        let (token, _) = other
            .generate_access_token(Uuid::new_v4(), Role::Admin)
            .unwrap();

        let result = UserAuth::from_headers(&jwt(), &headers_with(&format!("Bearer {}", token)));
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }
}
