//! Quota Counter: forms created by a user within the current local day.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::clock::{local_day_bounds, Clock};
use super::error::PolicyResult;
use crate::models::FormCreationRecord;
use crate::repository::CreationLogRepository;

#[derive(Clone)]
pub struct QuotaCounter {
    repo: Arc<dyn CreationLogRepository>,
    clock: Arc<dyn Clock>,
}

impl QuotaCounter {
    pub fn new(repo: Arc<dyn CreationLogRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Creation records of the user between local midnight and the next one.
    pub async fn count_today(&self, user_id: Uuid) -> PolicyResult<u64> {
        let now = self.clock.now();
        let (start, end) = local_day_bounds(now, self.clock.local_offset(now));
        Ok(self.repo.count_between(user_id, start, end).await?)
    }

    /// Appends a creation record. Only called once a creation was allowed.
    pub async fn record(
        &self,
        user_id: Uuid,
        form_id: &str,
        created_at: DateTime<Utc>,
    ) -> PolicyResult<()> {
        let record = FormCreationRecord {
            user_id,
            form_id: form_id.to_string(),
            created_at,
        };
        Ok(self.repo.append(&record).await?)
    }
}
