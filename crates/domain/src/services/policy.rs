//! Pure restriction decisions.
//!
//! Every function here takes the policy and the current instant as explicit
//! arguments so the rules can be checked without storage or a clock.

use chrono::{DateTime, Utc};

use crate::models::{FormConfig, PolicySettings};

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    QuotaExceeded,
    Expired,
    NotFound,
}

impl DenyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DenyReason::QuotaExceeded => "quota exceeded",
            DenyReason::Expired => "expired",
            DenyReason::NotFound => "not found",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a form creation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateDecision {
    /// Creation may proceed; the new form gets this expiry.
    Allow { expires_at: Option<DateTime<Utc>> },
    Deny(DenyReason),
}

impl CreateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, CreateDecision::Allow { .. })
    }
}

/// Outcome of a form access check.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessDecision {
    Allow(FormConfig),
    Deny(DenyReason),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow(_))
    }
}

/// Expiry of a form created at `created_at`, or `None` when it never expires.
pub fn compute_expires_at(
    created_at: DateTime<Utc>,
    policy: &PolicySettings,
    exempt: bool,
) -> Option<DateTime<Utc>> {
    if !policy.restrictions_enabled || exempt {
        return None;
    }
    // An expiry past the representable range means the form never expires
    policy
        .lifespan()
        .and_then(|lifespan| created_at.checked_add_signed(lifespan))
}

/// Whether a form created at `created_at` is expired at `now`.
///
/// A form is expired only when its age is strictly greater than the lifespan.
/// Disabled restrictions, an exempt owner or a missing lifespan all mean the
/// form is alive.
pub fn is_expired(
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    policy: &PolicySettings,
    exempt: bool,
) -> bool {
    if !policy.restrictions_enabled || exempt {
        return false;
    }
    match policy.lifespan() {
        Some(lifespan) => now - created_at > lifespan,
        None => false,
    }
}

/// Decides whether a user who already created `created_today` forms today
/// may create another one at `now`.
pub fn evaluate_creation(
    policy: &PolicySettings,
    exempt: bool,
    created_today: u64,
    now: DateTime<Utc>,
) -> CreateDecision {
    if !policy.restrictions_enabled || exempt {
        return CreateDecision::Allow { expires_at: None };
    }

    if let Some(max) = policy.daily_quota() {
        if created_today >= max as u64 {
            return CreateDecision::Deny(DenyReason::QuotaExceeded);
        }
    }

    CreateDecision::Allow {
        expires_at: compute_expires_at(now, policy, exempt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn policy(lifespan_ms: i64, max: i32) -> PolicySettings {
        PolicySettings {
            restrictions_enabled: true,
            link_lifespan_value: Some(lifespan_ms),
            link_lifespan_unit: Some(crate::models::LifespanUnit::Seconds),
            link_lifespan_ms: Some(lifespan_ms),
            max_forms_per_user_per_day: Some(max),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let p = policy(1000, 10);
        assert!(!is_expired(now - Duration::milliseconds(999), now, &p, false));
        assert!(!is_expired(now - Duration::milliseconds(1000), now, &p, false));
        assert!(is_expired(now - Duration::milliseconds(1001), now, &p, false));
    }

    #[test]
    fn test_exempt_or_disabled_never_expires() {
        let now = Utc::now();
        let old = now - Duration::days(365);
        let mut p = policy(1000, 10);
        assert!(!is_expired(old, now, &p, true));

        p.restrictions_enabled = false;
        assert!(!is_expired(old, now, &p, false));
        assert_eq!(compute_expires_at(now, &p, false), None);
    }

    #[test]
    fn test_missing_lifespan_fails_open() {
        let now = Utc::now();
        let mut p = policy(1000, 10);
        p.link_lifespan_ms = None;
        assert!(!is_expired(now - Duration::days(30), now, &p, false));
        assert_eq!(compute_expires_at(now, &p, false), None);
    }

    #[test]
    fn test_unrepresentable_expiry_never_expires() {
        let now = Utc::now();
        let p = policy(i64::MAX / 2, 10);
        assert_eq!(compute_expires_at(now, &p, false), None);
        assert!(!is_expired(now - Duration::days(365), now, &p, false));
    }

    #[test]
    fn test_creation_quota_boundary() {
        let now = Utc::now();
        let p = policy(60_000, 2);
        assert_eq!(
            evaluate_creation(&p, false, 1, now),
            CreateDecision::Allow {
                expires_at: Some(now + Duration::milliseconds(60_000))
            }
        );
        assert_eq!(
            evaluate_creation(&p, false, 2, now),
            CreateDecision::Deny(DenyReason::QuotaExceeded)
        );
    }

    #[test]
    fn test_creation_exempt_ignores_quota() {
        let now = Utc::now();
        let p = policy(60_000, 2);
        assert_eq!(
            evaluate_creation(&p, true, 50, now),
            CreateDecision::Allow { expires_at: None }
        );
    }

    #[test]
    fn test_deny_reason_display() {
        assert_eq!(DenyReason::QuotaExceeded.to_string(), "quota exceeded");
        assert_eq!(DenyReason::Expired.to_string(), "expired");
        assert_eq!(DenyReason::NotFound.to_string(), "not found");
    }
}
