//! Form and submission entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{FormConfig, Submission};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the forms table.
#[derive(Debug, Clone, FromRow)]
pub struct FormEntity {
    pub form_id: String,
    pub user_id: Uuid,
    pub title: String,
    pub template: String,
    pub styling: serde_json::Value,
    pub button: serde_json::Value,
    pub fields: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<FormEntity> for FormConfig {
    fn from(entity: FormEntity) -> Self {
        Self {
            form_id: entity.form_id,
            user_id: entity.user_id,
            title: entity.title,
            template: entity.template,
            styling: entity.styling,
            button: entity.button,
            fields: entity.fields,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            expires_at: entity.expires_at,
        }
    }
}

/// Database row mapping for the submissions table.
#[derive(Debug, Clone, FromRow)]
pub struct SubmissionEntity {
    pub id: Uuid,
    pub form_id: String,
    pub user_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl From<SubmissionEntity> for Submission {
    fn from(entity: SubmissionEntity) -> Self {
        Self {
            id: entity.id,
            form_id: entity.form_id,
            user_id: entity.user_id,
            submitted_at: entity.submitted_at,
            data: entity.data,
        }
    }
}
