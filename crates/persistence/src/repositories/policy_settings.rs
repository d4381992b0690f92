//! Policy settings repository for database operations.

use async_trait::async_trait;
use domain::models::PolicySettings;
use domain::repository::{SettingsRepository, StoreResult};
use sqlx::PgPool;

use super::store_error;
use crate::entities::{LifespanUnitDb, PolicySettingsEntity};
use crate::metrics::QueryTimer;

/// Repository for the singleton policy_settings row.
#[derive(Clone)]
pub struct PgSettingsRepository {
    pool: PgPool,
}

impl PgSettingsRepository {
    /// Creates a new PgSettingsRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn upsert(
        &self,
        settings: &PolicySettings,
        overwrite: bool,
    ) -> Result<PolicySettingsEntity, sqlx::Error> {
        let query = if overwrite {
            r#"
            INSERT INTO policy_settings (id, restrictions_enabled, link_lifespan_value,
                link_lifespan_unit, link_lifespan_ms, max_forms_per_user_per_day, updated_at)
            VALUES (1, $1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                restrictions_enabled = EXCLUDED.restrictions_enabled,
                link_lifespan_value = EXCLUDED.link_lifespan_value,
                link_lifespan_unit = EXCLUDED.link_lifespan_unit,
                link_lifespan_ms = EXCLUDED.link_lifespan_ms,
                max_forms_per_user_per_day = EXCLUDED.max_forms_per_user_per_day,
                updated_at = EXCLUDED.updated_at
            RETURNING restrictions_enabled, link_lifespan_value, link_lifespan_unit,
                      link_lifespan_ms, max_forms_per_user_per_day, updated_at
            "#
        } else {
            // DO UPDATE with a no-op assignment so RETURNING yields the existing row
            r#"
            INSERT INTO policy_settings (id, restrictions_enabled, link_lifespan_value,
                link_lifespan_unit, link_lifespan_ms, max_forms_per_user_per_day, updated_at)
            VALUES (1, $1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET id = policy_settings.id
            RETURNING restrictions_enabled, link_lifespan_value, link_lifespan_unit,
                      link_lifespan_ms, max_forms_per_user_per_day, updated_at
            "#
        };

        sqlx::query_as::<_, PolicySettingsEntity>(query)
            .bind(settings.restrictions_enabled)
            .bind(settings.link_lifespan_value)
            .bind(settings.link_lifespan_unit.map(LifespanUnitDb::from))
            .bind(settings.link_lifespan_ms)
            .bind(settings.max_forms_per_user_per_day)
            .bind(settings.updated_at)
            .fetch_one(&self.pool)
            .await
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    async fn get_or_create(&self, defaults: &PolicySettings) -> StoreResult<PolicySettings> {
        let timer = QueryTimer::new("get_or_create_policy_settings");
        let result = self.upsert(defaults, false).await;
        timer.record();
        result.map(Into::into).map_err(store_error)
    }

    async fn save(&self, settings: &PolicySettings) -> StoreResult<PolicySettings> {
        let timer = QueryTimer::new("save_policy_settings");
        let result = self.upsert(settings, true).await;
        timer.record();
        result.map(Into::into).map_err(store_error)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(store_error)
    }
}
