//! Form creation log repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::FormCreationRecord;
use domain::repository::{CreationLogRepository, StoreResult};
use sqlx::PgPool;
use uuid::Uuid;

use super::store_error;
use crate::metrics::QueryTimer;

/// Repository for the append-only form_creations table.
#[derive(Clone)]
pub struct PgCreationLogRepository {
    pool: PgPool,
}

impl PgCreationLogRepository {
    /// Creates a new PgCreationLogRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CreationLogRepository for PgCreationLogRepository {
    async fn append(&self, record: &FormCreationRecord) -> StoreResult<()> {
        let timer = QueryTimer::new("append_form_creation");
        let result = sqlx::query(
            r#"
            INSERT INTO form_creations (user_id, form_id, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(record.user_id)
        .bind(&record.form_id)
        .bind(record.created_at)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ()).map_err(store_error)
    }

    async fn count_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let timer = QueryTimer::new("count_form_creations");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM form_creations
            WHERE user_id = $1 AND created_at >= $2 AND created_at < $3
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(|count| count.max(0) as u64).map_err(store_error)
    }

    async fn delete_by_form(&self, form_id: &str) -> StoreResult<u64> {
        let timer = QueryTimer::new("delete_form_creations_by_form");
        let result = sqlx::query("DELETE FROM form_creations WHERE form_id = $1")
            .bind(form_id)
            .execute(&self.pool)
            .await;
        timer.record();
        result.map(|done| done.rows_affected()).map_err(store_error)
    }
}
