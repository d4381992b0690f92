//! Payment gateway webhook.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use domain::models::{PaymentOutcome, PaymentWebhookEvent};
use serde::Serialize;
use tracing::{info, warn};

use crate::app::AppState;
use crate::error::ApiError;

/// Hex HMAC-SHA512 of the raw request body under the webhook secret.
pub const SIGNATURE_HEADER: &str = "x-payment-signature";

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Receive a payment outcome from the gateway.
///
/// POST /api/v1/payments/webhook
///
/// The signature is checked against the raw bytes before the body is parsed.
/// Events other than `charge.success` and `charge.failed` are acknowledged
/// and ignored.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing payment signature".to_string()))?;

    if !shared::crypto::verify_hmac_sha512(
        &state.config.payments.webhook_secret,
        &body,
        signature,
    ) {
        warn!("Payment webhook with invalid signature rejected");
        return Err(ApiError::Unauthorized("Invalid payment signature".to_string()));
    }

    let event: PaymentWebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("Invalid webhook payload: {}", e)))?;

    match event.outcome() {
        Some(PaymentOutcome::Succeeded) => {
            state
                .subscriptions
                .confirm_payment(&event.data.reference)
                .await?;
        }
        Some(PaymentOutcome::Failed) => {
            state
                .subscriptions
                .fail_payment(&event.data.reference)
                .await?;
        }
        None => {
            info!(event = %event.event, "Ignoring unhandled payment event");
        }
    }

    Ok(Json(WebhookAck { received: true }))
}
