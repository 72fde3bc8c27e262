// Scheduler engine: polls cron triggers and runs due jobs sequentially

use super::{run_job, Job};
use crate::errors::ScheduleError;
use crate::schedule::{date_in, next_execution_after};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::time::interval;
use tracing::{debug, info, instrument, warn};

/// Configuration for the scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often to check triggers (in seconds)
    pub poll_interval_seconds: u64,
    /// Timezone the cron expressions and "today" are evaluated in
    pub timezone: Tz,
}

/// A job bound to its cron expression
pub struct Trigger {
    job: Arc<dyn Job>,
    expression: String,
    next_due: Option<DateTime<Utc>>,
}

impl Trigger {
    /// First firing is the next cron time strictly after `now`
    pub fn new(
        job: Arc<dyn Job>,
        expression: impl Into<String>,
        timezone: Tz,
        now: DateTime<Utc>,
    ) -> Result<Self, ScheduleError> {
        let expression = expression.into();
        let next_due = Some(next_execution_after(&expression, timezone, now)?);
        Ok(Self {
            job,
            expression,
            next_due,
        })
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.next_due
    }
}

/// Main scheduler engine implementation
///
/// Jobs run one after another on the polling task, so triggers never overlap.
/// Missed firings (e.g. while a long run was in progress) collapse into one.
pub struct SchedulerEngine {
    config: SchedulerConfig,
    triggers: Mutex<Vec<Trigger>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl SchedulerEngine {
    pub fn new(config: SchedulerConfig, triggers: Vec<Trigger>) -> Self {
        let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);
        Self {
            config,
            triggers: Mutex::new(triggers),
            shutdown_tx,
        }
    }

    /// Get a shutdown signal receiver
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Ask the polling loop to stop after the current tick
    pub fn stop(&self) {
        info!("Stopping scheduler engine");
        let _ = self.shutdown_tx.send(());
    }

    /// Run every job whose trigger is due at `now`; returns how many ran
    #[instrument(skip(self))]
    pub async fn run_due(&self, now: DateTime<Utc>) -> usize {
        let due = self.take_due(now).await;

        for (job, due_at) in &due {
            // "Today" is the firing's own date, even when the poll lands after midnight
            let today = date_in(*due_at, self.config.timezone);
            // Failures are logged and counted by run_job; the loop keeps going
            let _ = run_job(job.as_ref(), today).await;
        }
        due.len()
    }

    /// Collect due jobs with their firing instant and advance triggers past `now`
    async fn take_due(&self, now: DateTime<Utc>) -> Vec<(Arc<dyn Job>, DateTime<Utc>)> {
        let mut triggers = self.triggers.lock().await;
        let mut due = Vec::new();

        for trigger in triggers.iter_mut() {
            let Some(next) = trigger.next_due else {
                continue;
            };
            if next > now {
                continue;
            }

            due.push((trigger.job.clone(), next));
            trigger.next_due =
                match next_execution_after(&trigger.expression, self.config.timezone, now) {
                    Ok(at) => Some(at),
                    Err(e) => {
                        warn!(job = trigger.job.name(), error = %e, "Trigger has no further firings, disabling");
                        None
                    }
                };
            debug!(job = trigger.job.name(), next_due = ?trigger.next_due, "Trigger advanced");
        }
        due
    }

    /// Start the polling loop; returns once `stop` is called
    #[instrument(skip(self))]
    pub async fn start(&self) {
        info!(
            poll_interval_seconds = self.config.poll_interval_seconds,
            timezone = %self.config.timezone,
            "Starting scheduler engine"
        );

        let mut poll_interval = interval(Duration::from_secs(self.config.poll_interval_seconds));
        let mut shutdown_rx = self.shutdown_receiver();

        loop {
            tokio::select! {
                _ = poll_interval.tick() => {
                    let ran = self.run_due(Utc::now()).await;
                    if ran > 0 {
                        info!(jobs_run = ran, "Processed due jobs");
                    } else {
                        debug!("No jobs due");
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping scheduler");
                    break;
                }
            }
        }

        info!("Scheduler engine stopped");
    }
}
