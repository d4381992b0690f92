//! Submission repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::Submission;
use domain::repository::{StoreError, StoreResult, SubmissionRepository};
use sqlx::PgPool;
use uuid::Uuid;

use super::store_error;
use crate::entities::SubmissionEntity;
use crate::metrics::QueryTimer;

/// Repository for submission-related database operations.
#[derive(Clone)]
pub struct PgSubmissionRepository {
    pool: PgPool,
}

impl PgSubmissionRepository {
    /// Creates a new PgSubmissionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionRepository for PgSubmissionRepository {
    async fn insert(&self, submission: &Submission) -> StoreResult<Submission> {
        let timer = QueryTimer::new("insert_submission");
        let result = sqlx::query_as::<_, SubmissionEntity>(
            r#"
            INSERT INTO submissions (id, form_id, user_id, submitted_at, data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, form_id, user_id, submitted_at, data
            "#,
        )
        .bind(submission.id)
        .bind(&submission.form_id)
        .bind(submission.user_id)
        .bind(submission.submitted_at)
        .bind(&submission.data)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(Into::into).map_err(store_error)
    }

    async fn list_by_form(
        &self,
        form_id: &str,
        before: Option<(DateTime<Utc>, String)>,
        limit: i64,
    ) -> StoreResult<Vec<Submission>> {
        let before = before
            .map(|(ts, id)| {
                Uuid::parse_str(&id)
                    .map(|id| (ts, id))
                    .map_err(|e| StoreError::Backend(format!("invalid submission cursor: {}", e)))
            })
            .transpose()?;
        let (before_ts, before_id) = before.unzip();

        let timer = QueryTimer::new("list_submissions_by_form");
        let result = sqlx::query_as::<_, SubmissionEntity>(
            r#"
            SELECT id, form_id, user_id, submitted_at, data
            FROM submissions
            WHERE form_id = $1
              AND ($2::timestamptz IS NULL OR (submitted_at, id) < ($2, $3))
            ORDER BY submitted_at DESC, id DESC
            LIMIT $4
            "#,
        )
        .bind(form_id)
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

    async fn delete_by_form(&self, form_id: &str) -> StoreResult<u64> {
        let timer = QueryTimer::new("delete_submissions_by_form");
        let result = sqlx::query("DELETE FROM submissions WHERE form_id = $1")
            .bind(form_id)
            .execute(&self.pool)
            .await;
        timer.record();
        result.map(|done| done.rows_affected()).map_err(store_error)
    }
}
