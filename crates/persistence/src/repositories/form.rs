//! Form repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::FormConfig;
use domain::repository::{FormRepository, StoreResult};
use sqlx::PgPool;
use uuid::Uuid;

use super::store_error;
use crate::entities::FormEntity;
use crate::metrics::QueryTimer;

const COLUMNS: &str = "form_id, user_id, title, template, styling, button, fields, \
                       created_at, updated_at, expires_at";

/// Repository for form-related database operations.
#[derive(Clone)]
pub struct PgFormRepository {
    pool: PgPool,
}

impl PgFormRepository {
    /// Creates a new PgFormRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FormRepository for PgFormRepository {
    async fn find(&self, form_id: &str) -> StoreResult<Option<FormConfig>> {
        let timer = QueryTimer::new("find_form");
        let result = sqlx::query_as::<_, FormEntity>(&format!(
            "SELECT {COLUMNS} FROM forms WHERE form_id = $1"
        ))
        .bind(form_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|row| row.map(Into::into)).map_err(store_error)
    }

    async fn insert(&self, form: &FormConfig) -> StoreResult<FormConfig> {
        let timer = QueryTimer::new("insert_form");
        let result = sqlx::query_as::<_, FormEntity>(&format!(
            r#"
            INSERT INTO forms (form_id, user_id, title, template, styling, button, fields,
                               created_at, updated_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&form.form_id)
        .bind(form.user_id)
        .bind(&form.title)
        .bind(&form.template)
        .bind(&form.styling)
        .bind(&form.button)
        .bind(&form.fields)
        .bind(form.created_at)
        .bind(form.updated_at)
        .bind(form.expires_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(Into::into).map_err(store_error)
    }

    async fn update(&self, form: &FormConfig) -> StoreResult<Option<FormConfig>> {
        let timer = QueryTimer::new("update_form");
        let result = sqlx::query_as::<_, FormEntity>(&format!(
            r#"
            UPDATE forms
            SET title = $2, template = $3, styling = $4, button = $5, fields = $6, updated_at = $7
            WHERE form_id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&form.form_id)
        .bind(&form.title)
        .bind(&form.template)
        .bind(&form.styling)
        .bind(&form.button)
        .bind(&form.fields)
        .bind(form.updated_at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|row| row.map(Into::into)).map_err(store_error)
    }

    async fn set_expires_at(
        &self,
        form_id: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let timer = QueryTimer::new("set_form_expires_at");
        let result = sqlx::query("UPDATE forms SET expires_at = $2 WHERE form_id = $1")
            .bind(form_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await;
        timer.record();
        result.map(|_| ()).map_err(store_error)
    }

    async fn list_by_owner(
        &self,
        user_id: Uuid,
        before: Option<(DateTime<Utc>, String)>,
        limit: i64,
    ) -> StoreResult<Vec<FormConfig>> {
        let timer = QueryTimer::new("list_forms_by_owner");
        let (before_ts, before_id) = before.unzip();
        let result = sqlx::query_as::<_, FormEntity>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM forms
            WHERE user_id = $1
              AND ($2::timestamptz IS NULL OR (created_at, form_id) < ($2, $3))
            ORDER BY created_at DESC, form_id DESC
            LIMIT $4
            "#
        ))
        .bind(user_id)
        .bind(before_ts)
        .bind(before_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(store_error)
    }

    async fn list_page(
        &self,
        after: Option<(DateTime<Utc>, String)>,
        limit: i64,
    ) -> StoreResult<Vec<FormConfig>> {
        let timer = QueryTimer::new("list_forms_page");
        let (after_ts, after_id) = after.unzip();
        let result = sqlx::query_as::<_, FormEntity>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM forms
            WHERE $1::timestamptz IS NULL OR (created_at, form_id) > ($1, $2)
            ORDER BY created_at, form_id
            LIMIT $3
            "#
        ))
        .bind(after_ts)
        .bind(after_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(store_error)
    }

    async fn delete(&self, form_id: &str) -> StoreResult<bool> {
        let timer = QueryTimer::new("delete_form");
        let result = sqlx::query("DELETE FROM forms WHERE form_id = $1")
            .bind(form_id)
            .execute(&self.pool)
            .await;
        timer.record();
        result
            .map(|done| done.rows_affected() > 0)
            .map_err(store_error)
    }
}
