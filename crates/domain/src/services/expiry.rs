//! Expiry Evaluator: lazy form expiry and reaping.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::error::PolicyResult;
use super::policy::{compute_expires_at, is_expired, AccessDecision, DenyReason};
use super::settings_store::SettingsStore;
use super::subscription_oracle::SubscriptionOracle;
use crate::models::{FormConfig, PolicySettings};
use crate::repository::Repositories;

/// Forms fetched per page during a sweep.
pub const SWEEP_PAGE_SIZE: i64 = 200;

/// Result of a batch sweep over every stored form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub examined: u64,
    pub reaped: u64,
    /// Survivors whose stored `expires_at` changed
    pub updated: u64,
}

#[derive(Clone)]
pub struct ExpiryEvaluator {
    repos: Repositories,
    settings: SettingsStore,
    oracle: SubscriptionOracle,
    clock: Arc<dyn Clock>,
}

impl ExpiryEvaluator {
    pub fn new(
        repos: Repositories,
        settings: SettingsStore,
        oracle: SubscriptionOracle,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repos,
            settings,
            oracle,
            clock,
        }
    }

    /// Decides whether a form may be accessed, reaping it when expired.
    pub async fn evaluate(&self, form_id: &str) -> PolicyResult<AccessDecision> {
        let Some(form) = self.repos.forms.find(form_id).await? else {
            return Ok(AccessDecision::Deny(DenyReason::NotFound));
        };

        let policy = self.settings.get_policy().await?;
        if !policy.restrictions_enabled {
            return Ok(AccessDecision::Allow(form));
        }

        let exempt = self.oracle.is_exempt(form.user_id).await?;
        match self.apply(form, &policy, exempt).await? {
            Some(form) => Ok(AccessDecision::Allow(form)),
            None => Ok(AccessDecision::Deny(DenyReason::Expired)),
        }
    }

    /// Returns true unless the form exists and is alive. Expired forms are
    /// deleted before returning.
    pub async fn check_and_reap(&self, form_id: &str) -> PolicyResult<bool> {
        Ok(!self.evaluate(form_id).await?.is_allowed())
    }

    /// Applies an already fetched policy and exemption to a loaded form.
    /// Returns `None` if the form was expired and has been reaped.
    pub async fn apply(
        &self,
        form: FormConfig,
        policy: &PolicySettings,
        exempt: bool,
    ) -> PolicyResult<Option<FormConfig>> {
        if is_expired(form.created_at, self.clock.now(), policy, exempt) {
            self.reap(&form.form_id).await?;
            return Ok(None);
        }
        Ok(Some(form))
    }

    /// Deletes an expired form and its dependents.
    pub async fn reap(&self, form_id: &str) -> PolicyResult<()> {
        if self.delete_cascade(form_id).await? {
            metrics::counter!("forms_reaped_total").increment(1);
            info!(form_id = %form_id, "Expired form reaped");
        }
        Ok(())
    }

    /// Deletes a form, then its submissions and creation records.
    ///
    /// Only the form delete can fail the call. Once the form is gone its
    /// dependents are unreachable, so their delete failures are logged and left
    /// for a later sweep. Returns whether the form row was present.
    pub async fn delete_cascade(&self, form_id: &str) -> PolicyResult<bool> {
        let removed = self.repos.forms.delete(form_id).await?;

        match self.repos.submissions.delete_by_form(form_id).await {
            Ok(count) => debug!(form_id = %form_id, count, "Submissions deleted"),
            Err(e) => warn!(form_id = %form_id, error = %e, "Failed to delete submissions"),
        }
        if let Err(e) = self.repos.creations.delete_by_form(form_id).await {
            warn!(form_id = %form_id, error = %e, "Failed to delete creation records");
        }

        Ok(removed)
    }

    /// Walks every stored form under `policy`: reaps the expired ones and
    /// rewrites `expires_at` on survivors whose value changed.
    ///
    /// Individual failures are logged and skipped; only a failed page read
    /// aborts the sweep.
    pub async fn sweep(&self, policy: &PolicySettings) -> PolicyResult<SweepReport> {
        let entitled = self.oracle.entitled_users().await?;
        let now = self.clock.now();
        let mut report = SweepReport::default();
        let mut after: Option<(DateTime<Utc>, String)> = None;

        loop {
            let page = self.repos.forms.list_page(after.clone(), SWEEP_PAGE_SIZE).await?;
            let full_page = page.len() as i64 == SWEEP_PAGE_SIZE;
            after = page.last().map(|f| (f.created_at, f.form_id.clone()));

            for form in page {
                report.examined += 1;
                let exempt = entitled.contains(&form.user_id);

                if is_expired(form.created_at, now, policy, exempt) {
                    match self.reap(&form.form_id).await {
                        Ok(()) => report.reaped += 1,
                        Err(e) => {
                            warn!(form_id = %form.form_id, error = %e, "Failed to reap form during sweep")
                        }
                    }
                    continue;
                }

                let expires_at = compute_expires_at(form.created_at, policy, exempt);
                if expires_at != form.expires_at {
                    match self.repos.forms.set_expires_at(&form.form_id, expires_at).await {
                        Ok(()) => report.updated += 1,
                        Err(e) => {
                            warn!(form_id = %form.form_id, error = %e, "Failed to update form expiry")
                        }
                    }
                }
            }

            if !full_page {
                break;
            }
        }

        info!(
            examined = report.examined,
            reaped = report.reaped,
            updated = report.updated,
            "Expiry sweep finished"
        );
        Ok(report)
    }
}
