// Worker binary entry point
// Purpose: run one job (or the chat self-test) once and exit

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use common::bootstrap::{build_calendar_sync, build_reminder_scanner, init_chat_webhook, load_settings};
use common::schedule::today_in;
use common::scheduler::run_job;
use common::telemetry::init_logging;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "worker", version, about = "Content calendar automation jobs")]
struct Cli {
    /// Directory holding default.toml / local.toml
    #[arg(long, global = true, default_value = "config")]
    config_dir: PathBuf,

    /// Override today's date (YYYY-MM-DD) instead of the configured timezone's
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the content calendar and send due reminders
    Reminders,
    /// Create calendar events for unsynced rows
    CalendarSync,
    /// Post a test message to the chat webhook
    TestChat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(&cli.config_dir)?;
    init_logging(
        &settings.observability.log_level,
        settings.observability.json_logs,
    )?;

    let today = match cli.today {
        Some(date) => date,
        None => today_in(settings.tz()?),
    };

    match cli.command {
        Command::Reminders => {
            let scanner = build_reminder_scanner(&settings)?;
            run_job(&scanner, today)
                .await
                .context("Reminder scan aborted")?;
        }
        Command::CalendarSync => {
            let sync = build_calendar_sync(&settings)?;
            run_job(&sync, today)
                .await
                .context("Calendar sync aborted")?;
        }
        Command::TestChat => {
            let webhook = init_chat_webhook(&settings)?;
            let status = webhook.send_test_message().await.map_err(|e| {
                error!(error = %e, "Chat webhook test failed");
                e
            })?;
            info!(status = status, "Chat webhook responded");
            if !(200..300).contains(&status) {
                bail!("Chat webhook returned status {}", status);
            }
        }
    }

    Ok(())
}
