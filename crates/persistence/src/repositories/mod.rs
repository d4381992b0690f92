//! PostgreSQL implementations of the domain repository traits.

pub mod creation_log;
pub mod form;
pub mod policy_settings;
pub mod submission;
pub mod subscription;

use std::sync::Arc;

use domain::repository::{Repositories, StoreError};
use sqlx::PgPool;

pub use creation_log::PgCreationLogRepository;
pub use form::PgFormRepository;
pub use policy_settings::PgSettingsRepository;
pub use submission::PgSubmissionRepository;
pub use subscription::PgSubscriptionRepository;

/// PostgreSQL unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Every repository backed by the given pool.
pub fn pg_repositories(pool: PgPool) -> Repositories {
    Repositories {
        settings: Arc::new(PgSettingsRepository::new(pool.clone())),
        subscriptions: Arc::new(PgSubscriptionRepository::new(pool.clone())),
        forms: Arc::new(PgFormRepository::new(pool.clone())),
        submissions: Arc::new(PgSubmissionRepository::new(pool.clone())),
        creations: Arc::new(PgCreationLogRepository::new(pool)),
    }
}

/// Maps a sqlx error onto the storage error the services understand.
pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::Conflict(db.message().to_string())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}
