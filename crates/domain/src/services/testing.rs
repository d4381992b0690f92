//! Test fixtures for the policy services.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use super::clock::{Clock, FixedClock};
use super::engine::PolicyEngine;
use crate::models::{
    FormConfig, LifespanUnit, PolicySettings, Submission, Subscription, SubscriptionStatus,
    UpdatePolicyRequest,
};
use crate::repository::memory::InMemoryStore;
use crate::repository::{FormRepository, SettingsRepository, SubmissionRepository};

pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<FixedClock>,
    pub engine: PolicyEngine,
}

impl Fixture {
    /// Clock fixed at midday UTC so day-boundary effects stay out of the way.
    pub fn new() -> Self {
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();
        Self::with_clock(Arc::new(FixedClock::new(now)))
    }

    pub fn with_clock(clock: Arc<FixedClock>) -> Self {
        let store = InMemoryStore::new();
        let engine = PolicyEngine::new(store.repositories(), clock.clone());
        Self {
            store,
            clock,
            engine,
        }
    }

    /// Stores a policy directly, bypassing validation.
    pub async fn set_policy(&self, enabled: bool, lifespan_ms: i64, max_per_day: i32) {
        let settings = PolicySettings {
            restrictions_enabled: enabled,
            link_lifespan_value: (lifespan_ms > 0).then_some(lifespan_ms / 1000),
            link_lifespan_unit: (lifespan_ms > 0).then_some(LifespanUnit::Seconds),
            link_lifespan_ms: (lifespan_ms > 0).then_some(lifespan_ms),
            max_forms_per_user_per_day: (max_per_day > 0).then_some(max_per_day),
            updated_at: self.clock.now(),
        };
        self.store.save(&settings).await.unwrap();
    }

    pub async fn insert_form(&self, form: FormConfig) {
        FormRepository::insert(&*self.store, &form).await.unwrap();
    }

    pub async fn insert_submission(&self, submission: Submission) {
        SubmissionRepository::insert(&*self.store, &submission)
            .await
            .unwrap();
    }
}

pub fn form(id: &str, user_id: Uuid, created_at: DateTime<Utc>) -> FormConfig {
    FormConfig {
        form_id: id.to_string(),
        user_id,
        title: format!("Form {}", id),
        template: "classic".to_string(),
        styling: json!({}),
        button: json!({"label": "Submit", "behaviour": "submit"}),
        fields: json!([{"name": "email", "type": "email"}]),
        created_at,
        updated_at: created_at,
        expires_at: None,
    }
}

pub fn submission(form_id: &str, owner: Uuid, at: DateTime<Utc>) -> Submission {
    Submission {
        id: Uuid::new_v4(),
        form_id: form_id.to_string(),
        user_id: owner,
        submitted_at: at,
        data: json!({"email": "someone@example.com"}),
    }
}

pub fn subscription(
    user_id: Uuid,
    status: SubscriptionStatus,
    end_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
) -> Subscription {
    Subscription {
        id: Uuid::new_v4(),
        user_id,
        status,
        start_date: end_date.map(|end| end - Duration::days(30)),
        end_date,
        reference: format!("fl_sub_{}", Uuid::new_v4().simple()),
        amount_minor: 500_000,
        currency: "NGN".to_string(),
        created_at,
        updated_at: created_at,
    }
}

pub fn request(
    enabled: bool,
    value: Option<i64>,
    unit: Option<&str>,
    max: Option<i64>,
) -> UpdatePolicyRequest {
    UpdatePolicyRequest {
        restrictions_enabled: enabled,
        link_lifespan_value: value,
        link_lifespan_unit: unit.map(str::to_string),
        max_forms_per_user_per_day: max,
    }
}
