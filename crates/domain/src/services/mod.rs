//! Restriction policy engine and the services built on it.

pub mod clock;
pub mod engine;
pub mod error;
pub mod expiry;
pub mod forms;
pub mod policy;
pub mod policy_gate;
pub mod quota_counter;
pub mod settings_store;
pub mod subscription_oracle;
pub mod subscriptions;

#[cfg(test)]
mod testing;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::PolicyEngine;
pub use error::{PolicyError, PolicyResult};
pub use expiry::{ExpiryEvaluator, SweepReport};
pub use forms::{FormService, Page};
pub use policy::{AccessDecision, CreateDecision, DenyReason};
pub use policy_gate::PolicyGate;
pub use quota_counter::QuotaCounter;
pub use settings_store::SettingsStore;
pub use subscription_oracle::SubscriptionOracle;
pub use subscriptions::SubscriptionService;
