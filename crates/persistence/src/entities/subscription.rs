//! Subscription entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Subscription, SubscriptionStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for subscription_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "lowercase")]
pub enum SubscriptionStatusDb {
    Pending,
    Active,
    Inactive,
}

impl From<SubscriptionStatusDb> for SubscriptionStatus {
    fn from(db: SubscriptionStatusDb) -> Self {
        match db {
            SubscriptionStatusDb::Pending => SubscriptionStatus::Pending,
            SubscriptionStatusDb::Active => SubscriptionStatus::Active,
            SubscriptionStatusDb::Inactive => SubscriptionStatus::Inactive,
        }
    }
}

/// Database row mapping for the subscriptions table.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: SubscriptionStatusDb,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub reference: String,
    pub amount_minor: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SubscriptionEntity> for Subscription {
    fn from(entity: SubscriptionEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            status: entity.status.into(),
            start_date: entity.start_date,
            end_date: entity.end_date,
            reference: entity.reference,
            amount_minor: entity.amount_minor,
            currency: entity.currency,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
