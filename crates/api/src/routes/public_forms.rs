//! Share-link endpoints: anyone holding the link may view and submit.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{PublicFormResponse, SubmissionResponse, SubmitFormRequest};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

/// Malformed share ids cannot name a form.
fn check_share_id(form_id: &str) -> Result<(), ApiError> {
    shared::validation::validate_share_id(form_id)
        .map_err(|_| ApiError::NotFound("Form not found".to_string()))
}

/// Fetch a live form's configuration.
///
/// GET /api/v1/public/forms/:form_id
pub async fn get_public_form(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
) -> Result<Json<PublicFormResponse>, ApiError> {
    check_share_id(&form_id)?;

    let form = state.forms.get_public_form(&form_id).await?;
    Ok(Json(form.into()))
}

/// Submit data to a live form.
///
/// POST /api/v1/public/forms/:form_id/submissions
pub async fn submit_form(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    Json(request): Json<SubmitFormRequest>,
) -> Result<(StatusCode, Json<SubmissionResponse>), ApiError> {
    check_share_id(&form_id)?;
    request.validate()?;

    let submission = state.forms.submit(&form_id, request.data).await?;
    info!(form_id = %form_id, submission_id = %submission.id, "Submission received");

    Ok((StatusCode::CREATED, Json(submission.into())))
}
