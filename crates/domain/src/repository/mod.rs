//! Storage collaborator contracts for the policy engine.
//!
//! The engine only talks to storage through these traits. The PostgreSQL
//! implementation lives in the persistence crate; [`memory::InMemoryStore`]
//! backs tests and local development.

pub mod memory;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    FormConfig, FormCreationRecord, NewSubscription, PolicySettings, Submission, Subscription,
};

/// Errors raised by a storage backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The backend failed to read or write.
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// A uniqueness constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Access to the singleton policy record.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Returns the stored policy, inserting `defaults` if none exists yet.
    async fn get_or_create(&self, defaults: &PolicySettings) -> StoreResult<PolicySettings>;

    /// Replaces the stored policy.
    async fn save(&self, settings: &PolicySettings) -> StoreResult<PolicySettings>;

    /// Cheap liveness probe of the backend.
    async fn ping(&self) -> StoreResult<()>;
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Most recently created active subscription of a user with `end_date > now`.
    async fn find_entitled(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Subscription>>;

    /// Users holding an entitled subscription at `now`.
    async fn entitled_user_ids(&self, now: DateTime<Utc>) -> StoreResult<HashSet<Uuid>>;

    async fn create_pending(
        &self,
        subscription: &NewSubscription,
        now: DateTime<Utc>,
    ) -> StoreResult<Subscription>;

    async fn find_by_reference(&self, reference: &str) -> StoreResult<Option<Subscription>>;

    /// Marks the subscription active for `[start, end)` and flips every other
    /// active subscription of the same user to inactive.
    async fn activate(
        &self,
        reference: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Subscription>>;

    /// Marks the subscription inactive.
    async fn deactivate(
        &self,
        reference: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Subscription>>;
}

#[async_trait]
pub trait FormRepository: Send + Sync {
    async fn find(&self, form_id: &str) -> StoreResult<Option<FormConfig>>;

    /// Inserts a new form; a duplicate `form_id` yields [`StoreError::Conflict`].
    async fn insert(&self, form: &FormConfig) -> StoreResult<FormConfig>;

    async fn update(&self, form: &FormConfig) -> StoreResult<Option<FormConfig>>;

    async fn set_expires_at(
        &self,
        form_id: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> StoreResult<()>;

    /// Forms of an owner, newest first, strictly older than `before`.
    async fn list_by_owner(
        &self,
        user_id: Uuid,
        before: Option<(DateTime<Utc>, String)>,
        limit: i64,
    ) -> StoreResult<Vec<FormConfig>>;

    /// All forms, oldest first, strictly after the `(created_at, form_id)` key.
    async fn list_page(
        &self,
        after: Option<(DateTime<Utc>, String)>,
        limit: i64,
    ) -> StoreResult<Vec<FormConfig>>;

    /// Deletes a form. Returns whether a row was removed; an absent form is not an error.
    async fn delete(&self, form_id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn insert(&self, submission: &Submission) -> StoreResult<Submission>;

    /// Submissions of a form, newest first, strictly older than `before`.
    async fn list_by_form(
        &self,
        form_id: &str,
        before: Option<(DateTime<Utc>, String)>,
        limit: i64,
    ) -> StoreResult<Vec<Submission>>;

    async fn delete_by_form(&self, form_id: &str) -> StoreResult<u64>;
}

#[async_trait]
pub trait CreationLogRepository: Send + Sync {
    async fn append(&self, record: &FormCreationRecord) -> StoreResult<()>;

    /// Records of a user with `start <= created_at < end`.
    async fn count_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<u64>;

    async fn delete_by_form(&self, form_id: &str) -> StoreResult<u64>;
}

/// Bundle of every repository the services need.
#[derive(Clone)]
pub struct Repositories {
    pub settings: Arc<dyn SettingsRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub forms: Arc<dyn FormRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
    pub creations: Arc<dyn CreationLogRepository>,
}
