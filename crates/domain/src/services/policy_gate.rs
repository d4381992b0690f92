//! Policy Gate: authorizes form creation and form access.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::clock::Clock;
use super::error::PolicyResult;
use super::expiry::ExpiryEvaluator;
use super::policy::{evaluate_creation, AccessDecision, CreateDecision};
use super::quota_counter::QuotaCounter;
use super::settings_store::SettingsStore;
use super::subscription_oracle::SubscriptionOracle;

#[derive(Clone)]
pub struct PolicyGate {
    settings: SettingsStore,
    oracle: SubscriptionOracle,
    quota: QuotaCounter,
    expiry: ExpiryEvaluator,
    clock: Arc<dyn Clock>,
}

impl PolicyGate {
    pub fn new(
        settings: SettingsStore,
        oracle: SubscriptionOracle,
        quota: QuotaCounter,
        expiry: ExpiryEvaluator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            oracle,
            quota,
            expiry,
            clock,
        }
    }

    /// Whether `user_id` may create a form now.
    ///
    /// Nothing is recorded here; the caller appends the creation record once
    /// the form is stored. Two checks taken before either record exists can
    /// both be allowed, so the quota may be overshot under concurrency.
    pub async fn authorize_create(&self, user_id: Uuid) -> PolicyResult<CreateDecision> {
        self.authorize_create_at(user_id, self.clock.now()).await
    }

    /// Same as [`authorize_create`](Self::authorize_create) with the expiry
    /// computed from the given creation instant.
    pub async fn authorize_create_at(
        &self,
        user_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> PolicyResult<CreateDecision> {
        let policy = self.settings.get_policy().await?;
        if !policy.restrictions_enabled {
            return Ok(CreateDecision::Allow { expires_at: None });
        }

        if self.oracle.is_exempt(user_id).await? {
            return Ok(CreateDecision::Allow { expires_at: None });
        }

        let created_today = self.quota.count_today(user_id).await?;
        Ok(evaluate_creation(&policy, false, created_today, created_at))
    }

    /// Whether the form behind `form_id` may be served.
    pub async fn authorize_access(&self, form_id: &str) -> PolicyResult<AccessDecision> {
        self.expiry.evaluate(form_id).await
    }
}
