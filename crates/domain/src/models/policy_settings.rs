//! Global restriction policy models for the admin panel.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default link lifespan when the policy is first created (7 days).
pub const DEFAULT_LINK_LIFESPAN_DAYS: i64 = 7;

/// Longest link lifespan an admin may configure (100 years).
pub const MAX_LINK_LIFESPAN_MS: i64 = 100 * 365 * 86_400_000;

/// Default daily form creation quota when the policy is first created.
pub const DEFAULT_MAX_FORMS_PER_USER_PER_DAY: i32 = 10;

/// Unit an admin expresses the link lifespan in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifespanUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl LifespanUnit {
    /// Milliseconds in one unit.
    pub fn millis(self) -> i64 {
        match self {
            LifespanUnit::Seconds => 1_000,
            LifespanUnit::Minutes => 60_000,
            LifespanUnit::Hours => 3_600_000,
            LifespanUnit::Days => 86_400_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifespanUnit::Seconds => "seconds",
            LifespanUnit::Minutes => "minutes",
            LifespanUnit::Hours => "hours",
            LifespanUnit::Days => "days",
        }
    }
}

impl std::fmt::Display for LifespanUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LifespanUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seconds" => Ok(LifespanUnit::Seconds),
            "minutes" => Ok(LifespanUnit::Minutes),
            "hours" => Ok(LifespanUnit::Hours),
            "days" => Ok(LifespanUnit::Days),
            other => Err(format!("unknown lifespan unit '{}'", other)),
        }
    }
}

/// The single global restriction policy.
///
/// When `restrictions_enabled` is true, `link_lifespan_ms` and
/// `max_forms_per_user_per_day` are both present and positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySettings {
    pub restrictions_enabled: bool,
    /// Lifespan as entered by the admin
    pub link_lifespan_value: Option<i64>,
    pub link_lifespan_unit: Option<LifespanUnit>,
    /// Lifespan converted to milliseconds at write time
    pub link_lifespan_ms: Option<i64>,
    pub max_forms_per_user_per_day: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

impl PolicySettings {
    /// Policy created on first access: restrictions on, 7-day links, 10 forms a day.
    pub fn defaults(now: DateTime<Utc>) -> Self {
        Self {
            restrictions_enabled: true,
            link_lifespan_value: Some(DEFAULT_LINK_LIFESPAN_DAYS),
            link_lifespan_unit: Some(LifespanUnit::Days),
            link_lifespan_ms: Some(DEFAULT_LINK_LIFESPAN_DAYS * LifespanUnit::Days.millis()),
            max_forms_per_user_per_day: Some(DEFAULT_MAX_FORMS_PER_USER_PER_DAY),
            updated_at: now,
        }
    }

    /// Configured link lifespan, if any. Non-positive values count as unset.
    pub fn lifespan(&self) -> Option<Duration> {
        self.link_lifespan_ms
            .filter(|ms| *ms > 0)
            .and_then(Duration::try_milliseconds)
    }

    /// Configured daily quota, if any. Non-positive values count as unset.
    pub fn daily_quota(&self) -> Option<i32> {
        self.max_forms_per_user_per_day.filter(|max| *max > 0)
    }
}

/// PUT request body for the admin settings endpoint.
///
/// The numeric fields are only required when restrictions are enabled;
/// the unit is kept as text so an unknown unit can be reported by field name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UpdatePolicyRequest {
    pub restrictions_enabled: bool,
    pub link_lifespan_value: Option<i64>,
    pub link_lifespan_unit: Option<String>,
    pub max_forms_per_user_per_day: Option<i64>,
}

/// Admin-facing view of the policy.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PolicySettingsResponse {
    pub restrictions_enabled: bool,
    pub link_lifespan_value: Option<i64>,
    pub link_lifespan_unit: Option<LifespanUnit>,
    pub link_lifespan_ms: Option<i64>,
    pub max_forms_per_user_per_day: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

impl From<PolicySettings> for PolicySettingsResponse {
    fn from(settings: PolicySettings) -> Self {
        Self {
            restrictions_enabled: settings.restrictions_enabled,
            link_lifespan_value: settings.link_lifespan_value,
            link_lifespan_unit: settings.link_lifespan_unit,
            link_lifespan_ms: settings.link_lifespan_ms,
            max_forms_per_user_per_day: settings.max_forms_per_user_per_day,
            updated_at: settings.updated_at,
        }
    }
}

/// Response of a policy update, including the sweep it triggered.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UpdatePolicyResponse {
    pub settings: PolicySettingsResponse,
    pub forms_reaped: u64,
    pub forms_updated: u64,
}
