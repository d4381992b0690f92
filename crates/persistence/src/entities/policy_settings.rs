//! Policy settings entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{LifespanUnit, PolicySettings};
use sqlx::FromRow;

/// Database enum for lifespan_unit that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "lifespan_unit", rename_all = "lowercase")]
pub enum LifespanUnitDb {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl From<LifespanUnitDb> for LifespanUnit {
    fn from(db: LifespanUnitDb) -> Self {
        match db {
            LifespanUnitDb::Seconds => LifespanUnit::Seconds,
            LifespanUnitDb::Minutes => LifespanUnit::Minutes,
            LifespanUnitDb::Hours => LifespanUnit::Hours,
            LifespanUnitDb::Days => LifespanUnit::Days,
        }
    }
}

impl From<LifespanUnit> for LifespanUnitDb {
    fn from(unit: LifespanUnit) -> Self {
        match unit {
            LifespanUnit::Seconds => LifespanUnitDb::Seconds,
            LifespanUnit::Minutes => LifespanUnitDb::Minutes,
            LifespanUnit::Hours => LifespanUnitDb::Hours,
            LifespanUnit::Days => LifespanUnitDb::Days,
        }
    }
}

/// Database row mapping for the policy_settings table.
#[derive(Debug, Clone, FromRow)]
pub struct PolicySettingsEntity {
    pub restrictions_enabled: bool,
    pub link_lifespan_value: Option<i64>,
    pub link_lifespan_unit: Option<LifespanUnitDb>,
    pub link_lifespan_ms: Option<i64>,
    pub max_forms_per_user_per_day: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

impl From<PolicySettingsEntity> for PolicySettings {
    fn from(entity: PolicySettingsEntity) -> Self {
        Self {
            restrictions_enabled: entity.restrictions_enabled,
            link_lifespan_value: entity.link_lifespan_value,
            link_lifespan_unit: entity.link_lifespan_unit.map(Into::into),
            link_lifespan_ms: entity.link_lifespan_ms,
            max_forms_per_user_per_day: entity.max_forms_per_user_per_day,
            updated_at: entity.updated_at,
        }
    }
}
