//! Paid plan lifecycle driven by the payment gateway.

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use super::clock::Clock;
use super::engine::PolicyEngine;
use super::error::{PolicyError, PolicyResult};
use crate::models::{NewSubscription, PlanTerms, Subscription, SubscriptionStatus};
use crate::repository::{StoreError, SubscriptionRepository};

/// Reference generation attempts before giving up on collisions.
const REFERENCE_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct SubscriptionService {
    engine: PolicyEngine,
    terms: PlanTerms,
}

impl SubscriptionService {
    pub fn new(engine: PolicyEngine, terms: PlanTerms) -> Self {
        Self { engine, terms }
    }

    pub fn terms(&self) -> &PlanTerms {
        &self.terms
    }

    fn repo(&self) -> &Arc<dyn SubscriptionRepository> {
        &self.engine.repositories().subscriptions
    }

    /// Creates a pending subscription with a fresh payment reference.
    pub async fn initiate(&self, user_id: Uuid) -> PolicyResult<Subscription> {
        let now = self.engine.clock().now();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let pending = NewSubscription {
                user_id,
                reference: shared::crypto::generate_payment_reference(),
                amount_minor: self.terms.amount_minor,
                currency: self.terms.currency.clone(),
            };

            match self.repo().create_pending(&pending, now).await {
                Ok(subscription) => {
                    info!(
                        user_id = %user_id,
                        reference = %subscription.reference,
                        "Subscription payment initiated"
                    );
                    return Ok(subscription);
                }
                Err(StoreError::Conflict(_)) if attempts < REFERENCE_ATTEMPTS => {
                    warn!(attempts, "Payment reference collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Activates the subscription behind `reference` for the plan duration.
    ///
    /// Only pending subscriptions are activated; a repeated confirmation
    /// returns the subscription unchanged.
    pub async fn confirm_payment(&self, reference: &str) -> PolicyResult<Subscription> {
        let existing = self.find(reference).await?;
        if existing.status != SubscriptionStatus::Pending {
            info!(
                reference = %reference,
                status = %existing.status,
                "Ignoring confirmation for non-pending subscription"
            );
            return Ok(existing);
        }

        let now = self.engine.clock().now();
        let end = now + Duration::days(self.terms.duration_days);
        let activated = self
            .repo()
            .activate(reference, now, end, now)
            .await?
            .ok_or_else(|| not_found(reference))?;

        info!(
            user_id = %activated.user_id,
            reference = %reference,
            end_date = %end,
            "Subscription activated"
        );
        Ok(activated)
    }

    /// Marks a pending subscription inactive after a failed payment.
    pub async fn fail_payment(&self, reference: &str) -> PolicyResult<Subscription> {
        let existing = self.find(reference).await?;
        if existing.status != SubscriptionStatus::Pending {
            return Ok(existing);
        }

        let now = self.engine.clock().now();
        let failed = self
            .repo()
            .deactivate(reference, now)
            .await?
            .ok_or_else(|| not_found(reference))?;

        info!(user_id = %failed.user_id, reference = %reference, "Subscription payment failed");
        Ok(failed)
    }

    /// The subscription currently exempting the user, if any.
    pub async fn current(&self, user_id: Uuid) -> PolicyResult<Option<Subscription>> {
        self.engine.oracle().current_subscription(user_id).await
    }

    async fn find(&self, reference: &str) -> PolicyResult<Subscription> {
        self.repo()
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| not_found(reference))
    }
}

fn not_found(reference: &str) -> PolicyError {
    PolicyError::NotFound(format!("Subscription {} not found", reference))
}
