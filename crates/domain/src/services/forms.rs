//! Form lifecycle operations, guarded by the policy gate.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::clock::Clock;
use super::engine::PolicyEngine;
use super::error::{PolicyError, PolicyResult};
use super::policy::{AccessDecision, CreateDecision, DenyReason};
use crate::models::{CreateFormRequest, FormConfig, QuotaResponse, Submission, UpdateFormRequest};
use crate::repository::StoreError;

/// Share id generation attempts before giving up on collisions.
const SHARE_ID_ATTEMPTS: usize = 5;

/// A page of results with the keyset position to continue from.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<(DateTime<Utc>, String)>,
}

#[derive(Clone)]
pub struct FormService {
    engine: PolicyEngine,
}

impl FormService {
    pub fn new(engine: PolicyEngine) -> Self {
        Self { engine }
    }

    /// Creates a form if the gate allows it and records the creation.
    pub async fn create_form(
        &self,
        user_id: Uuid,
        request: CreateFormRequest,
    ) -> PolicyResult<FormConfig> {
        let now = self.engine.clock().now();
        let expires_at = match self.engine.gate().authorize_create_at(user_id, now).await? {
            CreateDecision::Allow { expires_at } => expires_at,
            CreateDecision::Deny(reason) => {
                metrics::counter!("form_creation_denied_total", "reason" => reason.as_str())
                    .increment(1);
                info!(user_id = %user_id, reason = %reason, "Form creation denied");
                return Err(PolicyError::Denied(reason));
            }
        };

        let mut form = FormConfig {
            form_id: String::new(),
            user_id,
            title: request.title,
            template: request.template,
            styling: request.styling,
            button: request.button,
            fields: request.fields,
            created_at: now,
            updated_at: now,
            expires_at,
        };

        let forms = &self.engine.repositories().forms;
        let mut attempts = 0;
        let created = loop {
            attempts += 1;
            form.form_id = shared::crypto::generate_share_id();
            match forms.insert(&form).await {
                Ok(created) => break created,
                Err(StoreError::Conflict(_)) if attempts < SHARE_ID_ATTEMPTS => {
                    warn!(attempts, "Share id collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        };

        // An uncounted form must not stay live
        if let Err(e) = self.engine.quota().record(user_id, &created.form_id, now).await {
            if let Err(rollback) = self.engine.expiry().delete_cascade(&created.form_id).await {
                warn!(
                    form_id = %created.form_id,
                    error = %rollback,
                    "Failed to roll back unrecorded form"
                );
            }
            return Err(e);
        }

        metrics::counter!("forms_created_total").increment(1);
        info!(
            user_id = %user_id,
            form_id = %created.form_id,
            expires_at = ?created.expires_at,
            "Form created"
        );

        Ok(created)
    }

    /// A form owned by `user_id`, after lazy expiry. Other owners get NotFound.
    pub async fn get_owned_form(&self, user_id: Uuid, form_id: &str) -> PolicyResult<FormConfig> {
        let owned = self
            .engine
            .repositories()
            .forms
            .find(form_id)
            .await?
            .is_some_and(|form| form.user_id == user_id);
        if !owned {
            return Err(PolicyError::NotFound(format!("Form {} not found", form_id)));
        }

        match self.engine.gate().authorize_access(form_id).await? {
            AccessDecision::Allow(form) if form.user_id == user_id => Ok(form),
            AccessDecision::Deny(DenyReason::Expired) => {
                Err(PolicyError::Denied(DenyReason::Expired))
            }
            _ => Err(PolicyError::NotFound(format!("Form {} not found", form_id))),
        }
    }

    /// The owner's forms, newest first. Expired forms on the page are reaped
    /// and left out.
    pub async fn list_forms(
        &self,
        user_id: Uuid,
        before: Option<(DateTime<Utc>, String)>,
        limit: i64,
    ) -> PolicyResult<Page<FormConfig>> {
        let page = self
            .engine
            .repositories()
            .forms
            .list_by_owner(user_id, before, limit)
            .await?;
        let next = if page.len() as i64 == limit {
            page.last().map(|f| (f.created_at, f.form_id.clone()))
        } else {
            None
        };

        let policy = self.engine.settings().get_policy().await?;
        let exempt = policy.restrictions_enabled && self.engine.oracle().is_exempt(user_id).await?;

        let mut items = Vec::with_capacity(page.len());
        for form in page {
            if let Some(form) = self.engine.expiry().apply(form, &policy, exempt).await? {
                items.push(form);
            }
        }

        Ok(Page { items, next })
    }

    pub async fn update_form(
        &self,
        user_id: Uuid,
        form_id: &str,
        request: UpdateFormRequest,
    ) -> PolicyResult<FormConfig> {
        let mut form = self.get_owned_form(user_id, form_id).await?;
        request.apply(&mut form, self.engine.clock().now());

        self.engine
            .repositories()
            .forms
            .update(&form)
            .await?
            .ok_or_else(|| PolicyError::NotFound(format!("Form {} not found", form_id)))
    }

    /// Deletes an owned form with its submissions and creation record.
    pub async fn delete_form(&self, user_id: Uuid, form_id: &str) -> PolicyResult<()> {
        let owned = self
            .engine
            .repositories()
            .forms
            .find(form_id)
            .await?
            .is_some_and(|f| f.user_id == user_id);
        if !owned {
            return Err(PolicyError::NotFound(format!("Form {} not found", form_id)));
        }

        self.engine.expiry().delete_cascade(form_id).await?;
        info!(user_id = %user_id, form_id = %form_id, "Form deleted");
        Ok(())
    }

    /// A live form as served through its share link.
    pub async fn get_public_form(&self, form_id: &str) -> PolicyResult<FormConfig> {
        match self.engine.gate().authorize_access(form_id).await? {
            AccessDecision::Allow(form) => Ok(form),
            AccessDecision::Deny(reason) => Err(PolicyError::Denied(reason)),
        }
    }

    /// Stores a submission for a live form.
    pub async fn submit(&self, form_id: &str, data: Value) -> PolicyResult<Submission> {
        let form = self.get_public_form(form_id).await?;
        let submission = Submission {
            id: Uuid::new_v4(),
            form_id: form.form_id,
            user_id: form.user_id,
            submitted_at: self.engine.clock().now(),
            data,
        };

        let stored = self
            .engine
            .repositories()
            .submissions
            .insert(&submission)
            .await?;
        metrics::counter!("submissions_received_total").increment(1);
        Ok(stored)
    }

    /// Submissions of an owned form, newest first.
    pub async fn list_submissions(
        &self,
        user_id: Uuid,
        form_id: &str,
        before: Option<(DateTime<Utc>, String)>,
        limit: i64,
    ) -> PolicyResult<Page<Submission>> {
        let form = self.get_owned_form(user_id, form_id).await?;
        let items = self
            .engine
            .repositories()
            .submissions
            .list_by_form(&form.form_id, before, limit)
            .await?;
        let next = if items.len() as i64 == limit {
            items.last().map(|s| (s.submitted_at, s.id.to_string()))
        } else {
            None
        };
        Ok(Page { items, next })
    }

    /// Today's creation count against the caller's limit.
    pub async fn quota(&self, user_id: Uuid) -> PolicyResult<QuotaResponse> {
        let policy = self.engine.settings().get_policy().await?;
        let exempt = self.engine.oracle().is_exempt(user_id).await?;
        let used_today = self.engine.quota().count_today(user_id).await?;

        let daily_limit = if policy.restrictions_enabled && !exempt {
            policy.daily_quota()
        } else {
            None
        };

        Ok(QuotaResponse {
            exempt,
            restrictions_enabled: policy.restrictions_enabled,
            used_today,
            daily_limit,
            remaining_today: daily_limit.map(|limit| (limit as u64).saturating_sub(used_today)),
        })
    }
}
