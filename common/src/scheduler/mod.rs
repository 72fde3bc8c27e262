// Scheduler module: cron triggers for the reminder and calendar sync jobs

pub mod engine;

pub use engine::{SchedulerConfig, SchedulerEngine, Trigger};

use crate::calendar_sync::CalendarSync;
use crate::errors::JobError;
use crate::reminders::ReminderScanner;
use crate::telemetry::record_job_run;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Instant;
use tracing::{error, info};

/// A batch job that can be triggered for a given day
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Job: Send + Sync {
    /// Stable name used in logs and metric labels
    fn name(&self) -> &'static str;

    async fn execute(&self, today: NaiveDate) -> Result<(), JobError>;
}

#[async_trait]
impl Job for ReminderScanner {
    fn name(&self) -> &'static str {
        "reminders"
    }

    async fn execute(&self, today: NaiveDate) -> Result<(), JobError> {
        self.run(today).await.map(|_| ())
    }
}

#[async_trait]
impl Job for CalendarSync {
    fn name(&self) -> &'static str {
        "calendar_sync"
    }

    async fn execute(&self, today: NaiveDate) -> Result<(), JobError> {
        self.run(today).await.map(|_| ())
    }
}

/// Run `job` once, logging and recording the outcome
pub async fn run_job(job: &dyn Job, today: NaiveDate) -> Result<(), JobError> {
    let started = Instant::now();
    let result = job.execute(today).await;
    let elapsed = started.elapsed();

    match &result {
        Ok(()) => {
            record_job_run(job.name(), "success", elapsed);
            info!(job = job.name(), %today, duration_ms = elapsed.as_millis() as u64, "Job completed");
        }
        Err(e) => {
            record_job_run(job.name(), "failure", elapsed);
            error!(job = job.name(), %today, error = %e, "Job aborted");
        }
    }
    result
}
