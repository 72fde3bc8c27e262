// Scheduler binary entry point
// Purpose: long-running daemon firing both jobs on their cron expressions

use anyhow::{Context, Result};
use chrono::Utc;
use common::bootstrap::{build_calendar_sync, build_reminder_scanner, load_settings};
use common::scheduler::{SchedulerConfig, SchedulerEngine, Trigger};
use common::telemetry::{init_logging, init_metrics};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config_dir = std::env::var("CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    let settings = load_settings(&config_dir)?;
    init_logging(
        &settings.observability.log_level,
        settings.observability.json_logs,
    )?;

    info!(config_dir = %config_dir.display(), "Starting content calendar scheduler");

    if let Some(port) = settings.observability.metrics_port {
        init_metrics(port)?;
    }

    let timezone = settings.tz()?;
    let now = Utc::now();
    let mut triggers = Vec::new();

    if settings.schedule.reminders_enabled {
        let scanner = build_reminder_scanner(&settings)?;
        let trigger = Trigger::new(
            Arc::new(scanner),
            settings.schedule.reminders_cron.clone(),
            timezone,
            now,
        )
        .context("Invalid reminders schedule")?;
        info!(cron = %settings.schedule.reminders_cron, next_due = ?trigger.next_due(), "Reminder scan scheduled");
        triggers.push(trigger);
    }

    if settings.schedule.calendar_sync_enabled {
        let sync = build_calendar_sync(&settings)?;
        let trigger = Trigger::new(
            Arc::new(sync),
            settings.schedule.calendar_sync_cron.clone(),
            timezone,
            now,
        )
        .context("Invalid calendar sync schedule")?;
        info!(cron = %settings.schedule.calendar_sync_cron, next_due = ?trigger.next_due(), "Calendar sync scheduled");
        triggers.push(trigger);
    }

    if triggers.is_empty() {
        warn!("Both jobs are disabled, nothing to schedule");
        return Ok(());
    }

    let engine = Arc::new(SchedulerEngine::new(
        SchedulerConfig {
            poll_interval_seconds: settings.schedule.poll_interval_seconds,
            timezone,
        },
        triggers,
    ));

    // Set up graceful shutdown
    let engine_for_shutdown = engine.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C signal, initiating graceful shutdown"),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C, stopping"),
        }
        engine_for_shutdown.stop();
    });

    engine.start().await;

    info!("Scheduler stopped");
    Ok(())
}
