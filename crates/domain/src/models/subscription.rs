//! Subscription domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Pending,
    Active,
    Inactive,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubscriptionStatus::Pending),
            "active" => Ok(SubscriptionStatus::Active),
            "inactive" => Ok(SubscriptionStatus::Inactive),
            other => Err(format!("unknown subscription status '{}'", other)),
        }
    }
}

/// A paid-tier subscription row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: SubscriptionStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Unique external payment id
    pub reference: String,
    pub amount_minor: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Whether this row grants unrestricted use at `now`.
    pub fn is_entitled(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.end_date.is_some_and(|end| end > now)
    }
}

/// Data for a subscription created at payment initiation.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_id: Uuid,
    pub reference: String,
    pub amount_minor: i64,
    pub currency: String,
}

/// Price and length of the paid plan.
#[derive(Debug, Clone)]
pub struct PlanTerms {
    pub amount_minor: i64,
    pub currency: String,
    pub duration_days: i64,
}

/// Subscription as returned to its owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub status: SubscriptionStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub reference: String,
    pub amount_minor: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(s: Subscription) -> Self {
        Self {
            id: s.id,
            status: s.status,
            start_date: s.start_date,
            end_date: s.end_date,
            reference: s.reference,
            amount_minor: s.amount_minor,
            currency: s.currency,
            created_at: s.created_at,
        }
    }
}

/// GET /subscriptions/current response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CurrentSubscriptionResponse {
    pub exempt: bool,
    pub subscription: Option<SubscriptionResponse>,
}

/// Event posted by the payment gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentWebhookEvent {
    pub event: String,
    pub data: PaymentWebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentWebhookData {
    pub reference: String,
}

/// Outcome the gateway reports for a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded,
    Failed,
}

impl PaymentWebhookEvent {
    /// Maps the gateway event name; unknown events are ignored by the caller.
    pub fn outcome(&self) -> Option<PaymentOutcome> {
        match self.event.as_str() {
            "charge.success" => Some(PaymentOutcome::Succeeded),
            "charge.failed" => Some(PaymentOutcome::Failed),
            _ => None,
        }
    }
}
