//! Form endpoint handlers for the form owner.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use domain::models::{
    CreateFormRequest, FormListResponse, FormResponse, QuotaResponse, SubmissionListResponse,
    UpdateFormRequest,
};
use serde::Deserialize;
use shared::pagination::{clamp_page_size, decode_cursor, encode_cursor};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Query parameters for cursor-paginated listings.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

impl PageQuery {
    fn position(&self) -> Result<Option<(DateTime<Utc>, String)>, ApiError> {
        self.cursor
            .as_deref()
            .map(decode_cursor)
            .transpose()
            .map_err(|e| ApiError::Validation(format!("cursor: {}", e)))
    }
}

fn next_cursor(next: Option<(DateTime<Utc>, String)>) -> Option<String> {
    next.map(|(at, key)| encode_cursor(at, &key))
}

/// Create a form.
///
/// POST /api/v1/forms
pub async fn create_form(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateFormRequest>,
) -> Result<(StatusCode, Json<FormResponse>), ApiError> {
    request.validate()?;

    let form = state.forms.create_form(auth.user_id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(FormResponse::from_form(
            form,
            &state.config.server.public_base_url,
        )),
    ))
}

/// List the caller's forms, newest first.
///
/// GET /api/v1/forms?cursor=<cursor>&limit=<n>
pub async fn list_forms(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<PageQuery>,
) -> Result<Json<FormListResponse>, ApiError> {
    let before = query.position()?;
    let page = state
        .forms
        .list_forms(auth.user_id, before, clamp_page_size(query.limit))
        .await?;

    let base_url = &state.config.server.public_base_url;
    Ok(Json(FormListResponse {
        forms: page
            .items
            .into_iter()
            .map(|form| FormResponse::from_form(form, base_url))
            .collect(),
        next_cursor: next_cursor(page.next),
    }))
}

/// GET /api/v1/forms/:form_id
pub async fn get_form(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(form_id): Path<String>,
) -> Result<Json<FormResponse>, ApiError> {
    let form = state.forms.get_owned_form(auth.user_id, &form_id).await?;
    Ok(Json(FormResponse::from_form(
        form,
        &state.config.server.public_base_url,
    )))
}

/// Update title, template, styling, button or fields.
///
/// PUT /api/v1/forms/:form_id
pub async fn update_form(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(form_id): Path<String>,
    Json(request): Json<UpdateFormRequest>,
) -> Result<Json<FormResponse>, ApiError> {
    request.validate()?;

    let form = state
        .forms
        .update_form(auth.user_id, &form_id, request)
        .await?;
    Ok(Json(FormResponse::from_form(
        form,
        &state.config.server.public_base_url,
    )))
}

/// Delete a form with its submissions and creation record.
///
/// DELETE /api/v1/forms/:form_id
pub async fn delete_form(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(form_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.forms.delete_form(auth.user_id, &form_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Submissions of an owned form, newest first.
///
/// GET /api/v1/forms/:form_id/submissions?cursor=<cursor>&limit=<n>
pub async fn list_submissions(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(form_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<SubmissionListResponse>, ApiError> {
    let before = query.position()?;
    if let Some((_, key)) = &before {
        Uuid::parse_str(key)
            .map_err(|_| ApiError::Validation("cursor: Invalid ID in cursor".to_string()))?;
    }

    let page = state
        .forms
        .list_submissions(auth.user_id, &form_id, before, clamp_page_size(query.limit))
        .await?;

    Ok(Json(SubmissionListResponse {
        submissions: page.items.into_iter().map(Into::into).collect(),
        next_cursor: next_cursor(page.next),
    }))
}

/// Today's creations against the caller's daily limit.
///
/// GET /api/v1/forms/quota
pub async fn get_quota(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<QuotaResponse>, ApiError> {
    Ok(Json(state.forms.quota(auth.user_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_page_query_without_cursor() {
        assert!(PageQuery::default().position().unwrap().is_none());
    }

    #[test]
    fn test_page_query_round_trips_cursor() {
        let at = Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();
        let query = PageQuery {
            cursor: next_cursor(Some((at, "Ab3xYz9QrStu".to_string()))),
            limit: None,
        };
        assert_eq!(
            query.position().unwrap(),
            Some((at, "Ab3xYz9QrStu".to_string()))
        );
    }

    #[test]
    fn test_page_query_rejects_garbage_cursor() {
        let query = PageQuery {
            cursor: Some("not a cursor!".to_string()),
            limit: None,
        };
        assert!(matches!(query.position(), Err(ApiError::Validation(_))));
    }
}
