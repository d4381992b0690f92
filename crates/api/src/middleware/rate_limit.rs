//! Per-user rate limiting.
//!
//! Each authenticated user gets a GCRA limiter from `governor`. Users with
//! an active subscription are limited by the subscriber quota, everyone
//! else by the standard quota.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::keyed::DashMapStateStore,
    Quota, RateLimiter,
};
use serde_json::json;
use std::num::NonZeroU32;
use uuid::Uuid;

use crate::app::AppState;
use crate::extractors::UserAuth;

type KeyedLimiter<C> =
    RateLimiter<Uuid, DashMapStateStore<Uuid>, C, NoOpMiddleware<<C as Clock>::Instant>>;

/// Which quota applies to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateTier {
    Standard,
    Subscriber,
}

/// One keyed limiter per tier, holding state for users seen recently.
///
/// A user who subscribes mid-window starts fresh in the subscriber limiter.
/// [`RateLimiterState::prune`] drops users whose quota has fully
/// replenished.
pub struct RateLimiterState<C: Clock = DefaultClock> {
    standard: KeyedLimiter<C>,
    subscriber: KeyedLimiter<C>,
    clock: C,
    standard_per_minute: u32,
    subscriber_per_minute: u32,
}

impl RateLimiterState {
    /// A zero subscriber limit falls back to the standard limit.
    pub fn new(standard_per_minute: u32, subscriber_per_minute: u32) -> Self {
        Self::with_clock(
            standard_per_minute,
            subscriber_per_minute,
            DefaultClock::default(),
        )
    }
}

impl<C: Clock + Clone> RateLimiterState<C> {
    pub fn with_clock(standard_per_minute: u32, subscriber_per_minute: u32, clock: C) -> Self {
        let subscriber_per_minute = if subscriber_per_minute == 0 {
            standard_per_minute
        } else {
            subscriber_per_minute
        };

        let keyed = |per_minute: u32| {
            let per_minute = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
            RateLimiter::new(
                Quota::per_minute(per_minute),
                DashMapStateStore::default(),
                clock.clone(),
            )
        };

        Self {
            standard: keyed(standard_per_minute),
            subscriber: keyed(subscriber_per_minute),
            clock,
            standard_per_minute,
            subscriber_per_minute,
        }
    }

    pub fn limit(&self, tier: RateTier) -> u32 {
        match tier {
            RateTier::Standard => self.standard_per_minute,
            RateTier::Subscriber => self.subscriber_per_minute,
        }
    }

    fn limiter(&self, tier: RateTier) -> &KeyedLimiter<C> {
        match tier {
            RateTier::Standard => &self.standard,
            RateTier::Subscriber => &self.subscriber,
        }
    }

    /// Returns the seconds to wait (at least 1) when the request is over quota.
    pub fn check(&self, user_id: Uuid, tier: RateTier) -> Result<(), u64> {
        self.limiter(tier).check_key(&user_id).map_err(|not_until| {
            not_until
                .wait_time_from(self.clock.now())
                .as_secs()
                .max(1)
        })
    }

    /// Forgets users whose limiter state is back to a fresh one.
    /// Returns how many entries remain.
    pub fn prune(&self) -> usize {
        for limiter in [&self.standard, &self.subscriber] {
            limiter.retain_recent();
            limiter.shrink_to_fit();
        }
        self.tracked_users()
    }

    /// Entries across both tiers.
    pub fn tracked_users(&self) -> usize {
        self.standard.len() + self.subscriber.len()
    }
}

impl<C: Clock + Clone> std::fmt::Debug for RateLimiterState<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("standard_per_minute", &self.standard_per_minute)
            .field("subscriber_per_minute", &self.subscriber_per_minute)
            .field("active_limiters", &self.tracked_users())
            .finish()
    }
}

/// Applies the caller's tier limit.
///
/// Must run after the auth middleware. Requests without an identity pass
/// through. If the subscription lookup fails the standard tier applies.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(rate_limiter) = state.rate_limiter.as_ref() else {
        return next.run(req).await;
    };
    let Some(user_id) = req.extensions().get::<UserAuth>().map(|a| a.user_id) else {
        return next.run(req).await;
    };

    let tier = match state.engine.oracle().is_exempt(user_id).await {
        Ok(true) => RateTier::Subscriber,
        Ok(false) => RateTier::Standard,
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Subscription lookup failed, using standard rate tier");
            RateTier::Standard
        }
    };

    if let Err(retry_after) = rate_limiter.check(user_id, tier) {
        tracing::info!(user_id = %user_id, tier = ?tier, retry_after, "Rate limit exceeded");
        return rate_limited_response(rate_limiter.limit(tier), retry_after);
    }

    next.run(req).await
}

fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limited",
        "message": format!("Rate limit of {} requests/minute exceeded", limit),
        "retry_after": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}
