//! Database entities (row mappings).

pub mod form;
pub mod policy_settings;
pub mod subscription;

pub use form::{FormEntity, SubmissionEntity};
pub use policy_settings::{LifespanUnitDb, PolicySettingsEntity};
pub use subscription::{SubscriptionEntity, SubscriptionStatusDb};
