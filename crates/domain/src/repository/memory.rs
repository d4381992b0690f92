//! In-memory repositories.
//!
//! Used by the test suites and for running the API without a database.
//! Failures can be injected to exercise the error paths of the services.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    CreationLogRepository, FormRepository, Repositories, SettingsRepository, StoreError,
    StoreResult, SubmissionRepository, SubscriptionRepository,
};
use crate::models::{
    FormConfig, FormCreationRecord, NewSubscription, PolicySettings, Submission, Subscription,
    SubscriptionStatus,
};

#[derive(Default)]
struct State {
    settings: Option<PolicySettings>,
    subscriptions: Vec<Subscription>,
    forms: BTreeMap<String, FormConfig>,
    submissions: Vec<Submission>,
    creations: Vec<FormCreationRecord>,
}

/// Shared in-memory backing for all repository traits.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    offline: AtomicBool,
    fail_submission_deletes: AtomicBool,
    fail_creation_appends: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every repository backed by this store.
    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            settings: self.clone(),
            subscriptions: self.clone(),
            forms: self.clone(),
            submissions: self.clone(),
            creations: self.clone(),
        }
    }

    /// Makes every operation fail with a backend error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes `SubmissionRepository::delete_by_form` fail.
    pub fn set_fail_submission_deletes(&self, fail: bool) {
        self.fail_submission_deletes.store(fail, Ordering::SeqCst);
    }

    /// Makes `CreationLogRepository::append` fail.
    pub fn set_fail_creation_appends(&self, fail: bool) {
        self.fail_creation_appends.store(fail, Ordering::SeqCst);
    }

    pub fn form_count(&self) -> usize {
        self.state().map(|s| s.forms.len()).unwrap_or_default()
    }

    pub fn submission_count(&self, form_id: &str) -> usize {
        self.state()
            .map(|s| s.submissions.iter().filter(|x| x.form_id == form_id).count())
            .unwrap_or_default()
    }

    pub fn creation_count(&self, form_id: &str) -> usize {
        self.state()
            .map(|s| s.creations.iter().filter(|x| x.form_id == form_id).count())
            .unwrap_or_default()
    }

    /// Inserts a subscription row as-is.
    pub fn seed_subscription(&self, subscription: Subscription) {
        if let Ok(mut state) = self.state() {
            state.subscriptions.push(subscription);
        }
    }

    /// Inserts a creation record as-is.
    pub fn seed_creation(&self, record: FormCreationRecord) {
        if let Ok(mut state) = self.state() {
            state.creations.push(record);
        }
    }

    fn state(&self) -> StoreResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    fn online_state(&self) -> StoreResult<MutexGuard<'_, State>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("store is offline".to_string()));
        }
        self.state()
    }
}

#[async_trait]
impl SettingsRepository for InMemoryStore {
    async fn get_or_create(&self, defaults: &PolicySettings) -> StoreResult<PolicySettings> {
        let mut state = self.online_state()?;
        Ok(state.settings.get_or_insert_with(|| defaults.clone()).clone())
    }

    async fn save(&self, settings: &PolicySettings) -> StoreResult<PolicySettings> {
        let mut state = self.online_state()?;
        state.settings = Some(settings.clone());
        Ok(settings.clone())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.online_state().map(|_| ())
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryStore {
    async fn find_entitled(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Subscription>> {
        let state = self.online_state()?;
        Ok(state
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id && s.is_entitled(now))
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn entitled_user_ids(&self, now: DateTime<Utc>) -> StoreResult<HashSet<Uuid>> {
        let state = self.online_state()?;
        Ok(state
            .subscriptions
            .iter()
            .filter(|s| s.is_entitled(now))
            .map(|s| s.user_id)
            .collect())
    }

    async fn create_pending(
        &self,
        subscription: &NewSubscription,
        now: DateTime<Utc>,
    ) -> StoreResult<Subscription> {
        let mut state = self.online_state()?;
        if state
            .subscriptions
            .iter()
            .any(|s| s.reference == subscription.reference)
        {
            return Err(StoreError::Conflict(format!(
                "subscription reference {} already exists",
                subscription.reference
            )));
        }

        let created = Subscription {
            id: Uuid::new_v4(),
            user_id: subscription.user_id,
            status: SubscriptionStatus::Pending,
            start_date: None,
            end_date: None,
            reference: subscription.reference.clone(),
            amount_minor: subscription.amount_minor,
            currency: subscription.currency.clone(),
            created_at: now,
            updated_at: now,
        };
        state.subscriptions.push(created.clone());
        Ok(created)
    }

    async fn find_by_reference(&self, reference: &str) -> StoreResult<Option<Subscription>> {
        let state = self.online_state()?;
        Ok(state
            .subscriptions
            .iter()
            .find(|s| s.reference == reference)
            .cloned())
    }

    async fn activate(
        &self,
        reference: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Subscription>> {
        let mut state = self.online_state()?;
        let Some(user_id) = state
            .subscriptions
            .iter()
            .find(|s| s.reference == reference)
            .map(|s| s.user_id)
        else {
            return Ok(None);
        };

        let mut activated = None;
        for s in state.subscriptions.iter_mut().filter(|s| s.user_id == user_id) {
            if s.reference == reference {
                s.status = SubscriptionStatus::Active;
                s.start_date = Some(start);
                s.end_date = Some(end);
                s.updated_at = now;
                activated = Some(s.clone());
            } else if s.status == SubscriptionStatus::Active {
                s.status = SubscriptionStatus::Inactive;
                s.updated_at = now;
            }
        }
        Ok(activated)
    }

    async fn deactivate(
        &self,
        reference: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Subscription>> {
        let mut state = self.online_state()?;
        Ok(state
            .subscriptions
            .iter_mut()
            .find(|s| s.reference == reference)
            .map(|s| {
                s.status = SubscriptionStatus::Inactive;
                s.updated_at = now;
                s.clone()
            }))
    }
}

#[async_trait]
impl FormRepository for InMemoryStore {
    async fn find(&self, form_id: &str) -> StoreResult<Option<FormConfig>> {
        let state = self.online_state()?;
        Ok(state.forms.get(form_id).cloned())
    }

    async fn insert(&self, form: &FormConfig) -> StoreResult<FormConfig> {
        let mut state = self.online_state()?;
        if state.forms.contains_key(&form.form_id) {
            return Err(StoreError::Conflict(format!(
                "form {} already exists",
                form.form_id
            )));
        }
        state.forms.insert(form.form_id.clone(), form.clone());
        Ok(form.clone())
    }

    async fn update(&self, form: &FormConfig) -> StoreResult<Option<FormConfig>> {
        let mut state = self.online_state()?;
        Ok(state.forms.get_mut(&form.form_id).map(|existing| {
            *existing = form.clone();
            existing.clone()
        }))
    }

    async fn set_expires_at(
        &self,
        form_id: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let mut state = self.online_state()?;
        if let Some(form) = state.forms.get_mut(form_id) {
            form.expires_at = expires_at;
        }
        Ok(())
    }

    async fn list_by_owner(
        &self,
        user_id: Uuid,
        before: Option<(DateTime<Utc>, String)>,
        limit: i64,
    ) -> StoreResult<Vec<FormConfig>> {
        let state = self.online_state()?;
        let mut forms: Vec<FormConfig> = state
            .forms
            .values()
            .filter(|f| f.user_id == user_id)
            .filter(|f| match &before {
                Some((ts, id)) => (f.created_at, &f.form_id) < (*ts, id),
                None => true,
            })
            .cloned()
            .collect();
        forms.sort_by(|a, b| (b.created_at, &b.form_id).cmp(&(a.created_at, &a.form_id)));
        forms.truncate(limit.max(0) as usize);
        Ok(forms)
    }

    async fn list_page(
        &self,
        after: Option<(DateTime<Utc>, String)>,
        limit: i64,
    ) -> StoreResult<Vec<FormConfig>> {
        let state = self.online_state()?;
        let mut forms: Vec<FormConfig> = state
            .forms
            .values()
            .filter(|f| match &after {
                Some((ts, id)) => (f.created_at, &f.form_id) > (*ts, id),
                None => true,
            })
            .cloned()
            .collect();
        forms.sort_by(|a, b| (a.created_at, &a.form_id).cmp(&(b.created_at, &b.form_id)));
        forms.truncate(limit.max(0) as usize);
        Ok(forms)
    }

    async fn delete(&self, form_id: &str) -> StoreResult<bool> {
        let mut state = self.online_state()?;
        Ok(state.forms.remove(form_id).is_some())
    }
}

#[async_trait]
impl SubmissionRepository for InMemoryStore {
    async fn insert(&self, submission: &Submission) -> StoreResult<Submission> {
        let mut state = self.online_state()?;
        state.submissions.push(submission.clone());
        Ok(submission.clone())
    }

    async fn list_by_form(
        &self,
        form_id: &str,
        before: Option<(DateTime<Utc>, String)>,
        limit: i64,
    ) -> StoreResult<Vec<Submission>> {
        let state = self.online_state()?;
        let mut submissions: Vec<Submission> = state
            .submissions
            .iter()
            .filter(|s| s.form_id == form_id)
            .filter(|s| match &before {
                Some((ts, id)) => (s.submitted_at, s.id.to_string()) < (*ts, id.clone()),
                None => true,
            })
            .cloned()
            .collect();
        submissions.sort_by(|a, b| {
            (b.submitted_at, b.id.to_string()).cmp(&(a.submitted_at, a.id.to_string()))
        });
        submissions.truncate(limit.max(0) as usize);
        Ok(submissions)
    }

    async fn delete_by_form(&self, form_id: &str) -> StoreResult<u64> {
        if self.fail_submission_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(
                "submission delete failed".to_string(),
            ));
        }
        let mut state = self.online_state()?;
        let before = state.submissions.len();
        state.submissions.retain(|s| s.form_id != form_id);
        Ok((before - state.submissions.len()) as u64)
    }
}

#[async_trait]
impl CreationLogRepository for InMemoryStore {
    async fn append(&self, record: &FormCreationRecord) -> StoreResult<()> {
        if self.fail_creation_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("creation append failed".to_string()));
        }
        let mut state = self.online_state()?;
        state.creations.push(record.clone());
        Ok(())
    }

    async fn count_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let state = self.online_state()?;
        Ok(state
            .creations
            .iter()
            .filter(|r| r.user_id == user_id && r.created_at >= start && r.created_at < end)
            .count() as u64)
    }

    async fn delete_by_form(&self, form_id: &str) -> StoreResult<u64> {
        let mut state = self.online_state()?;
        let before = state.creations.len();
        state.creations.retain(|r| r.form_id != form_id);
        Ok((before - state.creations.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn form(id: &str, user_id: Uuid, created_at: DateTime<Utc>) -> FormConfig {
        FormConfig {
            form_id: id.to_string(),
            user_id,
            title: "Test".to_string(),
            template: "classic".to_string(),
            styling: json!({}),
            button: json!({"label": "Submit", "behaviour": "submit"}),
            fields: json!([]),
            created_at,
            updated_at: created_at,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_settings_created_once() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let first = store.get_or_create(&PolicySettings::defaults(now)).await.unwrap();

        let mut other = PolicySettings::defaults(now);
        other.restrictions_enabled = false;
        let second = store.get_or_create(&other).await.unwrap();

        assert_eq!(first, second);
        assert!(second.restrictions_enabled);
    }

    #[tokio::test]
    async fn test_form_insert_conflict_and_idempotent_delete() {
        let store = InMemoryStore::new();
        let f = form("abc123", Uuid::new_v4(), Utc::now());

        FormRepository::insert(&*store, &f).await.unwrap();
        let err = FormRepository::insert(&*store, &f).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        assert!(store.delete("abc123").await.unwrap());
        assert!(!store.delete("abc123").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_by_owner_pagination() {
        let store = InMemoryStore::new();
        let user = Uuid::new_v4();
        let base = Utc::now();
        for i in 0..5 {
            FormRepository::insert(&*store, &form(&format!("form{}", i), user, base + Duration::seconds(i)))
                .await
                .unwrap();
        }
        FormRepository::insert(&*store, &form("other", Uuid::new_v4(), base))
            .await
            .unwrap();

        let page = store.list_by_owner(user, None, 2).await.unwrap();
        let ids: Vec<_> = page.iter().map(|f| f.form_id.as_str()).collect();
        assert_eq!(ids, vec!["form4", "form3"]);

        let last = page.last().unwrap();
        let next = store
            .list_by_owner(user, Some((last.created_at, last.form_id.clone())), 10)
            .await
            .unwrap();
        let ids: Vec<_> = next.iter().map(|f| f.form_id.as_str()).collect();
        assert_eq!(ids, vec!["form2", "form1", "form0"]);
    }

    #[tokio::test]
    async fn test_activate_supersedes_prior_active() {
        let store = InMemoryStore::new();
        let user = Uuid::new_v4();
        let now = Utc::now();
        for reference in ["ref_a", "ref_b"] {
            store
                .create_pending(
                    &NewSubscription {
                        user_id: user,
                        reference: reference.to_string(),
                        amount_minor: 1000,
                        currency: "NGN".to_string(),
                    },
                    now,
                )
                .await
                .unwrap();
        }

        store.activate("ref_a", now, now + Duration::days(30), now).await.unwrap();
        store.activate("ref_b", now, now + Duration::days(30), now).await.unwrap();

        let a = store.find_by_reference("ref_a").await.unwrap().unwrap();
        let b = store.find_by_reference("ref_b").await.unwrap().unwrap();
        assert_eq!(a.status, SubscriptionStatus::Inactive);
        assert_eq!(b.status, SubscriptionStatus::Active);
        assert_eq!(store.entitled_user_ids(now).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_count_between_is_half_open() {
        let store = InMemoryStore::new();
        let user = Uuid::new_v4();
        let start = Utc::now();
        let end = start + Duration::days(1);
        for at in [start, end - Duration::milliseconds(1), end] {
            store.seed_creation(FormCreationRecord {
                user_id: user,
                form_id: "f".to_string(),
                created_at: at,
            });
        }
        assert_eq!(store.count_between(user, start, end).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_offline_store_fails() {
        let store = InMemoryStore::new();
        store.set_offline(true);
        assert!(store.ping().await.is_err());
        store.set_offline(false);
        assert!(store.ping().await.is_ok());
    }
}
