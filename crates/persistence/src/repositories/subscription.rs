//! Subscription repository for database operations.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{NewSubscription, Subscription};
use domain::repository::{StoreResult, SubscriptionRepository};
use sqlx::PgPool;
use uuid::Uuid;

use super::store_error;
use crate::entities::SubscriptionEntity;
use crate::metrics::QueryTimer;

const COLUMNS: &str = "id, user_id, status, start_date, end_date, reference, amount_minor, \
                       currency, created_at, updated_at";

/// Repository for subscription-related database operations.
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Creates a new PgSubscriptionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_entitled(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Subscription>> {
        let timer = QueryTimer::new("find_entitled_subscription");
        let result = sqlx::query_as::<_, SubscriptionEntity>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM subscriptions
            WHERE user_id = $1 AND status = 'active' AND end_date > $2
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|row| row.map(Into::into)).map_err(store_error)
    }

    async fn entitled_user_ids(&self, now: DateTime<Utc>) -> StoreResult<HashSet<Uuid>> {
        let timer = QueryTimer::new("entitled_user_ids");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT DISTINCT user_id
            FROM subscriptions
            WHERE status = 'active' AND end_date > $1
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
            .map(|ids| ids.into_iter().collect())
            .map_err(store_error)
    }

    async fn create_pending(
        &self,
        subscription: &NewSubscription,
        now: DateTime<Utc>,
    ) -> StoreResult<Subscription> {
        let timer = QueryTimer::new("create_pending_subscription");
        let result = sqlx::query_as::<_, SubscriptionEntity>(&format!(
            r#"
            INSERT INTO subscriptions (id, user_id, status, reference, amount_minor, currency,
                                       created_at, updated_at)
            VALUES ($1, $2, 'pending', $3, $4, $5, $6, $6)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(subscription.user_id)
        .bind(&subscription.reference)
        .bind(subscription.amount_minor)
        .bind(&subscription.currency)
        .bind(now)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(Into::into).map_err(store_error)
    }

    async fn find_by_reference(&self, reference: &str) -> StoreResult<Option<Subscription>> {
        let timer = QueryTimer::new("find_subscription_by_reference");
        let result = sqlx::query_as::<_, SubscriptionEntity>(&format!(
            "SELECT {COLUMNS} FROM subscriptions WHERE reference = $1"
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|row| row.map(Into::into)).map_err(store_error)
    }

    async fn activate(
        &self,
        reference: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Subscription>> {
        let timer = QueryTimer::new("activate_subscription");

        // Superseding and activating happen atomically so a user never ends
        // up with two active rows
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'inactive', updated_at = $2
            WHERE status = 'active'
              AND reference <> $1
              AND user_id = (SELECT user_id FROM subscriptions WHERE reference = $1)
            "#,
        )
        .bind(reference)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(store_error)?;

        let activated = sqlx::query_as::<_, SubscriptionEntity>(&format!(
            r#"
            UPDATE subscriptions
            SET status = 'active', start_date = $2, end_date = $3, updated_at = $4
            WHERE reference = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(reference)
        .bind(start)
        .bind(end)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;
        timer.record();
        Ok(activated.map(Into::into))
    }

    async fn deactivate(
        &self,
        reference: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Subscription>> {
        let timer = QueryTimer::new("deactivate_subscription");
        let result = sqlx::query_as::<_, SubscriptionEntity>(&format!(
            r#"
            UPDATE subscriptions
            SET status = 'inactive', updated_at = $2
            WHERE reference = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(reference)
        .bind(now)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|row| row.map(Into::into)).map_err(store_error)
    }
}
