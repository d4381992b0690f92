//! Subscription endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::{CurrentSubscriptionResponse, SubscriptionResponse};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Start a plan purchase. The returned reference is handed to the payment
/// gateway; the subscription activates when the gateway confirms it.
///
/// POST /api/v1/subscriptions
pub async fn initiate_subscription(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<(StatusCode, Json<SubscriptionResponse>), ApiError> {
    let subscription = state.subscriptions.initiate(auth.user_id).await?;
    Ok((StatusCode::CREATED, Json(subscription.into())))
}

/// GET /api/v1/subscriptions/current
pub async fn current_subscription(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<CurrentSubscriptionResponse>, ApiError> {
    let subscription = state.subscriptions.current(auth.user_id).await?;

    Ok(Json(CurrentSubscriptionResponse {
        exempt: subscription.is_some(),
        subscription: subscription.map(Into::into),
    }))
}
