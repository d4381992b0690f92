//! Subscription Oracle: answers whether a user is exempt from restrictions.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use super::clock::Clock;
use super::error::PolicyResult;
use crate::models::Subscription;
use crate::repository::SubscriptionRepository;

/// Read-only view of subscription entitlement.
#[derive(Clone)]
pub struct SubscriptionOracle {
    repo: Arc<dyn SubscriptionRepository>,
    clock: Arc<dyn Clock>,
}

impl SubscriptionOracle {
    pub fn new(repo: Arc<dyn SubscriptionRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// True iff the user holds an active subscription ending after now.
    pub async fn is_exempt(&self, user_id: Uuid) -> PolicyResult<bool> {
        Ok(self.current_subscription(user_id).await?.is_some())
    }

    /// The entitling subscription, most recently created first.
    pub async fn current_subscription(&self, user_id: Uuid) -> PolicyResult<Option<Subscription>> {
        Ok(self.repo.find_entitled(user_id, self.clock.now()).await?)
    }

    /// Every user currently exempt, for batch decisions.
    pub async fn entitled_users(&self) -> PolicyResult<HashSet<Uuid>> {
        Ok(self.repo.entitled_user_ids(self.clock.now()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{subscription, Fixture};
    use crate::models::SubscriptionStatus;
    use chrono::Duration;

    #[tokio::test]
    async fn test_active_unexpired_subscription_is_exempt() {
        let fx = Fixture::new();
        let user = Uuid::new_v4();
        let now = fx.clock.now();
        fx.store.seed_subscription(subscription(
            user,
            SubscriptionStatus::Active,
            Some(now + Duration::days(3)),
            now,
        ));

        assert!(fx.engine.oracle().is_exempt(user).await.unwrap());
        assert!(!fx.engine.oracle().is_exempt(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_or_pending_subscription_is_not_exempt() {
        let fx = Fixture::new();
        let user = Uuid::new_v4();
        let now = fx.clock.now();
        fx.store.seed_subscription(subscription(
            user,
            SubscriptionStatus::Active,
            Some(now - Duration::seconds(1)),
            now - Duration::days(30),
        ));
        fx.store.seed_subscription(subscription(
            user,
            SubscriptionStatus::Pending,
            Some(now + Duration::days(30)),
            now,
        ));

        assert!(!fx.engine.oracle().is_exempt(user).await.unwrap());
    }

    #[tokio::test]
    async fn test_exemption_lapses_at_end_date() {
        let fx = Fixture::new();
        let user = Uuid::new_v4();
        let now = fx.clock.now();
        fx.store.seed_subscription(subscription(
            user,
            SubscriptionStatus::Active,
            Some(now + Duration::hours(1)),
            now,
        ));
        assert!(fx.engine.oracle().is_exempt(user).await.unwrap());

        fx.clock.advance(Duration::hours(1));
        assert!(!fx.engine.oracle().is_exempt(user).await.unwrap());
    }

    #[tokio::test]
    async fn test_most_recent_subscription_wins() {
        let fx = Fixture::new();
        let user = Uuid::new_v4();
        let now = fx.clock.now();
        let older = subscription(
            user,
            SubscriptionStatus::Active,
            Some(now + Duration::days(10)),
            now - Duration::days(5),
        );
        let newer = subscription(
            user,
            SubscriptionStatus::Active,
            Some(now + Duration::days(2)),
            now - Duration::days(1),
        );
        fx.store.seed_subscription(older);
        fx.store.seed_subscription(newer.clone());

        let current = fx.engine.oracle().current_subscription(user).await.unwrap();
        assert_eq!(current.map(|s| s.id), Some(newer.id));
    }
}
