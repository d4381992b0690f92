//! Settings Store: the single global restriction policy.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::clock::Clock;
use super::error::{PolicyError, PolicyResult};
use crate::models::{LifespanUnit, PolicySettings, UpdatePolicyRequest, MAX_LINK_LIFESPAN_MS};
use crate::repository::SettingsRepository;

/// Reads and writes the policy record.
#[derive(Clone)]
pub struct SettingsStore {
    repo: Arc<dyn SettingsRepository>,
    clock: Arc<dyn Clock>,
}

impl SettingsStore {
    pub fn new(repo: Arc<dyn SettingsRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Current policy, created with defaults on first access.
    pub async fn get_policy(&self) -> PolicyResult<PolicySettings> {
        let defaults = PolicySettings::defaults(self.clock.now());
        Ok(self.repo.get_or_create(&defaults).await?)
    }

    /// Validates and stores a new policy. Nothing is written if validation fails.
    pub async fn update_policy(&self, request: &UpdatePolicyRequest) -> PolicyResult<PolicySettings> {
        let current = self.get_policy().await?;
        let next = validate_update(request, &current, self.clock.now())?;
        let saved = self.repo.save(&next).await?;

        info!(
            restrictions_enabled = saved.restrictions_enabled,
            link_lifespan_ms = ?saved.link_lifespan_ms,
            max_forms_per_user_per_day = ?saved.max_forms_per_user_per_day,
            "Restriction policy updated"
        );

        Ok(saved)
    }
}

/// Builds the policy that results from applying `request` to `current`.
///
/// With restrictions enabled every numeric field must be present and
/// positive. With restrictions disabled omitted fields keep their stored
/// values, and provided ones are still checked.
pub fn validate_update(
    request: &UpdatePolicyRequest,
    current: &PolicySettings,
    now: DateTime<Utc>,
) -> PolicyResult<PolicySettings> {
    let enabled = request.restrictions_enabled;

    let value = match request.link_lifespan_value {
        Some(v) if v > 0 => Some(v),
        Some(_) => {
            return Err(PolicyError::validation(
                "link_lifespan_value",
                "must be a positive integer",
            ))
        }
        None if enabled => {
            return Err(PolicyError::validation(
                "link_lifespan_value",
                "is required when restrictions are enabled",
            ))
        }
        None => current.link_lifespan_value,
    };

    let unit = match request.link_lifespan_unit.as_deref() {
        Some(raw) => Some(raw.parse::<LifespanUnit>().map_err(|_| {
            PolicyError::validation(
                "link_lifespan_unit",
                "must be one of seconds, minutes, hours, days",
            )
        })?),
        None if enabled => {
            return Err(PolicyError::validation(
                "link_lifespan_unit",
                "is required when restrictions are enabled",
            ))
        }
        None => current.link_lifespan_unit,
    };

    let max_forms = match request.max_forms_per_user_per_day {
        Some(v) if v > 0 => Some(i32::try_from(v).map_err(|_| {
            PolicyError::validation("max_forms_per_user_per_day", "is too large")
        })?),
        Some(_) => {
            return Err(PolicyError::validation(
                "max_forms_per_user_per_day",
                "must be a positive integer",
            ))
        }
        None if enabled => {
            return Err(PolicyError::validation(
                "max_forms_per_user_per_day",
                "is required when restrictions are enabled",
            ))
        }
        None => current.max_forms_per_user_per_day,
    };

    let lifespan_ms = match (value, unit) {
        (Some(v), Some(u)) => Some(
            v.checked_mul(u.millis())
                .filter(|ms| *ms <= MAX_LINK_LIFESPAN_MS)
                .ok_or_else(|| PolicyError::validation("link_lifespan_value", "is too large"))?,
        ),
        _ => current.link_lifespan_ms.filter(|_| !enabled),
    };

    Ok(PolicySettings {
        restrictions_enabled: enabled,
        link_lifespan_value: value,
        link_lifespan_unit: unit,
        link_lifespan_ms: lifespan_ms,
        max_forms_per_user_per_day: max_forms,
        updated_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::InMemoryStore;
    use crate::services::clock::FixedClock;

    fn request(
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

    fn field_of(err: PolicyError) -> &'static str {
        match err {
            PolicyError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_converts_unit_to_millis() {
        let current = PolicySettings::defaults(Utc::now());
        let next =
            validate_update(&request(true, Some(2), Some("hours"), Some(5)), &current, Utc::now())
                .unwrap();
        assert_eq!(next.link_lifespan_ms, Some(7_200_000));
        assert_eq!(next.link_lifespan_unit, Some(LifespanUnit::Hours));
        assert_eq!(next.max_forms_per_user_per_day, Some(5));
    }

    #[test]
    fn test_rejections_name_the_field() {
        let current = PolicySettings::defaults(Utc::now());
        let now = Utc::now();

        let err = validate_update(&request(true, Some(0), Some("days"), Some(5)), &current, now);
        assert_eq!(field_of(err.unwrap_err()), "link_lifespan_value");

        let err = validate_update(&request(true, Some(1), Some("weeks"), Some(5)), &current, now);
        assert_eq!(field_of(err.unwrap_err()), "link_lifespan_unit");

        let err = validate_update(&request(true, Some(1), Some("days"), Some(0)), &current, now);
        assert_eq!(field_of(err.unwrap_err()), "max_forms_per_user_per_day");

        let err = validate_update(&request(true, Some(1), Some("days"), None), &current, now);
        assert_eq!(field_of(err.unwrap_err()), "max_forms_per_user_per_day");

        let err = validate_update(
            &request(true, Some(1), Some("days"), Some(i64::from(i32::MAX) + 1)),
            &current,
            now,
        );
        assert_eq!(field_of(err.unwrap_err()), "max_forms_per_user_per_day");
    }

    #[test]
    fn test_oversized_lifespan_rejected() {
        let current = PolicySettings::defaults(Utc::now());
        let now = Utc::now();

        let err = validate_update(
            &request(true, Some(100_000_000), Some("days"), Some(10)),
            &current,
            now,
        );
        assert_eq!(field_of(err.unwrap_err()), "link_lifespan_value");

        let err = validate_update(&request(true, Some(i64::MAX), Some("seconds"), Some(10)), &current, now);
        assert_eq!(field_of(err.unwrap_err()), "link_lifespan_value");

        let ok = validate_update(&request(true, Some(36_500), Some("days"), Some(10)), &current, now);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_disable_keeps_stored_values() {
        let current = PolicySettings::defaults(Utc::now());
        let next = validate_update(&request(false, None, None, None), &current, Utc::now()).unwrap();
        assert!(!next.restrictions_enabled);
        assert_eq!(next.link_lifespan_ms, current.link_lifespan_ms);
        assert_eq!(next.max_forms_per_user_per_day, current.max_forms_per_user_per_day);
    }

    #[tokio::test]
    async fn test_get_policy_creates_defaults() {
        let store = InMemoryStore::new();
        let settings = SettingsStore::new(store.clone(), Arc::new(FixedClock::new(Utc::now())));
        let policy = settings.get_policy().await.unwrap();
        assert!(policy.restrictions_enabled);
        assert_eq!(policy.link_lifespan_ms, Some(7 * 86_400_000));
        assert_eq!(policy.max_forms_per_user_per_day, Some(10));
    }

    #[tokio::test]
    async fn test_rejected_update_leaves_policy_unchanged() {
        let store = InMemoryStore::new();
        let settings = SettingsStore::new(store.clone(), Arc::new(FixedClock::new(Utc::now())));
        let before = settings.get_policy().await.unwrap();

        let result = settings
            .update_policy(&request(true, Some(3), Some("days"), Some(0)))
            .await;
        assert!(matches!(result, Err(PolicyError::Validation { .. })));
        assert_eq!(settings.get_policy().await.unwrap(), before);
    }
}
