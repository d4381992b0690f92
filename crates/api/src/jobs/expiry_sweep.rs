//! Periodic expiry sweep.
//!
//! Reaps forms past their expiry even if nobody opens them again. Access is
//! already correct without it through lazy expiry, so the job is off unless
//! `jobs.expiry_sweep_enabled` is set.

use domain::services::PolicyEngine;
use tracing::info;

use super::scheduler::{Job, JobFrequency};

pub struct ExpirySweepJob {
    engine: PolicyEngine,
    interval_minutes: u64,
}

impl ExpirySweepJob {
    pub fn new(engine: PolicyEngine, interval_minutes: u64) -> Self {
        Self {
            engine,
            interval_minutes: interval_minutes.max(1),
        }
    }
}

#[async_trait::async_trait]
impl Job for ExpirySweepJob {
    fn name(&self) -> &'static str {
        "expiry_sweep"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.interval_minutes)
    }

    async fn execute(&self) -> Result<(), String> {
        let report = self.engine.sweep().await.map_err(|e| e.to_string())?;
        info!(
            examined = report.examined,
            reaped = report.reaped,
            updated = report.updated,
            "Expiry sweep finished"
        );
        Ok(())
    }
}
