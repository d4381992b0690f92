//! Admin endpoints for the restriction policy.

use axum::{extract::State, Json};
use domain::models::{PolicySettingsResponse, UpdatePolicyRequest, UpdatePolicyResponse};
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// GET /api/v1/admin/settings
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<PolicySettingsResponse>, ApiError> {
    let settings = state.engine.settings().get_policy().await?;
    Ok(Json(settings.into()))
}

/// Replace the policy and sweep existing forms under it.
///
/// PUT /api/v1/admin/settings
pub async fn update_settings(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<UpdatePolicyRequest>,
) -> Result<Json<UpdatePolicyResponse>, ApiError> {
    let (settings, report) = state.engine.update_policy(&request).await?;

    info!(
        admin_id = %auth.user_id,
        restrictions_enabled = settings.restrictions_enabled,
        forms_reaped = report.reaped,
        forms_updated = report.updated,
        "Restriction policy updated"
    );

    Ok(Json(UpdatePolicyResponse {
        settings: settings.into(),
        forms_reaped: report.reaped,
        forms_updated: report.updated,
    }))
}
