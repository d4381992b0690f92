//! Wiring of the policy services over one set of repositories and a clock.

use std::sync::Arc;

use super::clock::Clock;
use super::error::PolicyResult;
use super::expiry::{ExpiryEvaluator, SweepReport};
use super::policy_gate::PolicyGate;
use super::quota_counter::QuotaCounter;
use super::settings_store::SettingsStore;
use super::subscription_oracle::SubscriptionOracle;
use crate::models::{PolicySettings, UpdatePolicyRequest};
use crate::repository::Repositories;

/// The restriction policy engine.
#[derive(Clone)]
pub struct PolicyEngine {
    repos: Repositories,
    clock: Arc<dyn Clock>,
    settings: SettingsStore,
    oracle: SubscriptionOracle,
    quota: QuotaCounter,
    expiry: ExpiryEvaluator,
    gate: PolicyGate,
}

impl PolicyEngine {
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>) -> Self {
        let settings = SettingsStore::new(repos.settings.clone(), clock.clone());
        let oracle = SubscriptionOracle::new(repos.subscriptions.clone(), clock.clone());
        let quota = QuotaCounter::new(repos.creations.clone(), clock.clone());
        let expiry = ExpiryEvaluator::new(
            repos.clone(),
            settings.clone(),
            oracle.clone(),
            clock.clone(),
        );
        let gate = PolicyGate::new(
            settings.clone(),
            oracle.clone(),
            quota.clone(),
            expiry.clone(),
            clock.clone(),
        );

        Self {
            repos,
            clock,
            settings,
            oracle,
            quota,
            expiry,
            gate,
        }
    }

    /// Stores a new policy, then sweeps every form under it.
    ///
    /// The sweep reaps forms that are already past their recomputed expiry
    /// when restrictions end up enabled, and rewrites `expires_at` on the
    /// rest. A failed sweep does not roll the policy back; lazy expiry and the
    /// next sweep finish the job.
    pub async fn update_policy(
        &self,
        request: &UpdatePolicyRequest,
    ) -> PolicyResult<(PolicySettings, SweepReport)> {
        let settings = self.settings.update_policy(request).await?;
        let report = self.expiry.sweep(&settings).await?;
        Ok((settings, report))
    }

    /// Sweeps every form under the stored policy.
    pub async fn sweep(&self) -> PolicyResult<SweepReport> {
        let policy = self.settings.get_policy().await?;
        self.expiry.sweep(&policy).await
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn oracle(&self) -> &SubscriptionOracle {
        &self.oracle
    }

    pub fn quota(&self) -> &QuotaCounter {
        &self.quota
    }

    pub fn expiry(&self) -> &ExpiryEvaluator {
        &self.expiry
    }

    pub fn gate(&self) -> &PolicyGate {
        &self.gate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubscriptionStatus;
    use crate::services::error::PolicyError;
    use crate::services::testing::{form, request, submission, subscription, Fixture};
    use chrono::Duration;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_reenabling_restrictions_sweeps_stale_forms() {
        let fx = Fixture::new();
        fx.set_policy(false, 0, 0).await;
        let now = fx.clock.now();
        let owner = Uuid::new_v4();
        fx.insert_form(form("stale", owner, now - Duration::hours(3))).await;
        fx.insert_form(form("fresh", owner, now - Duration::minutes(30))).await;
        fx.insert_submission(submission("stale", owner, now)).await;
        fx.insert_submission(submission("fresh", owner, now)).await;

        let (settings, report) = fx
            .engine
            .update_policy(&request(true, Some(1), Some("hours"), Some(10)))
            .await
            .unwrap();

        assert!(settings.restrictions_enabled);
        assert_eq!(report.reaped, 1);
        assert_eq!(fx.store.form_count(), 1);
        assert_eq!(fx.store.submission_count("stale"), 0);
        assert_eq!(fx.store.submission_count("fresh"), 1);

        let fresh = fx.engine.repositories().forms.find("fresh").await.unwrap().unwrap();
        assert_eq!(fresh.expires_at, Some(fresh.created_at + Duration::hours(1)));
    }

    #[tokio::test]
    async fn test_sweep_spares_exempt_owners() {
        let fx = Fixture::new();
        fx.set_policy(false, 0, 0).await;
        let now = fx.clock.now();
        let subscriber = Uuid::new_v4();
        fx.store.seed_subscription(subscription(
            subscriber,
            SubscriptionStatus::Active,
            Some(now + Duration::days(30)),
            now,
        ));
        fx.insert_form(form("paid", subscriber, now - Duration::days(10))).await;

        let (_, report) = fx
            .engine
            .update_policy(&request(true, Some(1), Some("days"), Some(10)))
            .await
            .unwrap();

        assert_eq!(report.reaped, 0);
        let paid = fx.engine.repositories().forms.find("paid").await.unwrap().unwrap();
        assert_eq!(paid.expires_at, None);
    }

    #[tokio::test]
    async fn test_oversized_lifespan_leaves_policy_and_forms_alone() {
        let fx = Fixture::new();
        fx.set_policy(true, 3_600_000, 10).await;
        let now = fx.clock.now();
        fx.insert_form(form("kept", Uuid::new_v4(), now - Duration::minutes(5))).await;
        let before = fx.engine.settings().get_policy().await.unwrap();

        let err = fx
            .engine
            .update_policy(&request(true, Some(100_000_000), Some("days"), Some(10)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PolicyError::Validation { field: "link_lifespan_value", .. }
        ));
        assert_eq!(fx.engine.settings().get_policy().await.unwrap(), before);
        assert_eq!(fx.store.form_count(), 1);
        fx.engine.sweep().await.unwrap();
        assert_eq!(fx.store.form_count(), 1);
    }

    #[tokio::test]
    async fn test_disabling_restrictions_clears_expiry() {
        let fx = Fixture::new();
        fx.set_policy(true, 3_600_000, 10).await;
        let now = fx.clock.now();
        let mut f = form("f", Uuid::new_v4(), now);
        f.expires_at = Some(now + Duration::hours(1));
        fx.insert_form(f).await;

        let (settings, report) = fx
            .engine
            .update_policy(&request(false, None, None, None))
            .await
            .unwrap();

        assert!(!settings.restrictions_enabled);
        assert_eq!(report.updated, 1);
        let f = fx.engine.repositories().forms.find("f").await.unwrap().unwrap();
        assert_eq!(f.expires_at, None);
    }

    #[tokio::test]
    async fn test_invalid_update_does_not_sweep() {
        let fx = Fixture::new();
        fx.set_policy(false, 0, 0).await;
        let now = fx.clock.now();
        fx.insert_form(form("stale", Uuid::new_v4(), now - Duration::days(30))).await;

        let result = fx
            .engine
            .update_policy(&request(true, Some(1), Some("hours"), Some(0)))
            .await;

        assert!(matches!(
            result,
            Err(PolicyError::Validation {
                field: "max_forms_per_user_per_day",
                ..
            })
        ));
        assert_eq!(fx.store.form_count(), 1);
        assert!(!fx.engine.settings().get_policy().await.unwrap().restrictions_enabled);
    }
}
