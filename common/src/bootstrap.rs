// Bootstrap utilities for binary initialization
// Purpose: build the job graph (adapters + jobs) from validated settings once,
// shared by the worker and scheduler binaries

use crate::calendar::{CalendarService, GoogleCalendarService};
use crate::calendar_sync::CalendarSync;
use crate::config::{SheetBackend, Settings};
use crate::documents::{DocumentProvisioner, DocumentStore, DriveDocumentStore};
use crate::google::GoogleClient;
use crate::notify::{ChatWebhook, Mailer, MessageComposer, ReminderNotifier, SlackWebhook, SmtpMailer};
use crate::reminders::ReminderScanner;
use crate::sheets::{CsvStore, GoogleSheetsStore, SheetStore, WorkbookStore};
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Load settings from `config_dir` and validate them
///
/// # Errors
/// Returns error if loading or validation fails
pub fn load_settings(config_dir: &Path) -> Result<Settings> {
    let settings = Settings::load_from_path(config_dir)
        .with_context(|| format!("Failed to load configuration from {}", config_dir.display()))?;
    settings.validate().context("Invalid configuration")?;
    Ok(settings)
}

/// Authorized client shared by the Google adapters
pub fn init_google_client(settings: &Settings) -> Result<GoogleClient> {
    GoogleClient::new(
        settings.google.access_token.clone(),
        settings.google.timeout_seconds,
    )
    .map_err(|e| anyhow!(e))
}

/// Sheet store for `sheet` on the configured backend
///
/// The csv backend keeps one file per sheet under `sheets.path`.
#[tracing::instrument(skip(settings))]
pub fn init_sheet_store(settings: &Settings, sheet: &str) -> Result<Arc<dyn SheetStore>> {
    let store: Arc<dyn SheetStore> = match settings.sheets.backend {
        SheetBackend::Google => {
            let spreadsheet_id = settings
                .sheets
                .spreadsheet_id
                .clone()
                .context("sheets.spreadsheet_id is required for the google backend")?;
            Arc::new(GoogleSheetsStore::new(
                init_google_client(settings)?,
                settings.google.sheets_api_base.clone(),
                spreadsheet_id,
            ))
        }
        SheetBackend::Xlsx => Arc::new(WorkbookStore::new(local_path(settings)?)),
        SheetBackend::Csv => {
            let file = Path::new(&local_path(settings)?).join(format!("{}.csv", sheet));
            Arc::new(CsvStore::new(file).with_sheet_name(sheet))
        }
    };

    info!(backend = ?settings.sheets.backend, "Sheet store initialized");
    Ok(store)
}

fn local_path(settings: &Settings) -> Result<String> {
    settings
        .sheets
        .path
        .clone()
        .context("sheets.path is required for local sheet backends")
}

/// Chat webhook client
pub fn init_chat_webhook(settings: &Settings) -> Result<SlackWebhook> {
    SlackWebhook::new(
        settings.chat.webhook_url.clone(),
        settings.chat.timeout_seconds,
    )
    .context("Failed to initialize chat webhook client")
}

/// Reminder scanner wired to the configured adapters
///
/// Must run inside a tokio runtime (the SMTP pool is created here).
#[tracing::instrument(skip(settings))]
pub fn build_reminder_scanner(settings: &Settings) -> Result<ReminderScanner> {
    let store = init_sheet_store(settings, &settings.reminders.sheet)?;

    let documents: Arc<dyn DocumentStore> = Arc::new(DriveDocumentStore::new(
        init_google_client(settings)?,
        settings.google.drive_api_base.clone(),
    ));
    let provisioner =
        DocumentProvisioner::new(documents, settings.reminders.template_doc_id.clone());

    let mailer: Arc<dyn Mailer> =
        Arc::new(SmtpMailer::new(&settings.email).context("Failed to initialize SMTP mailer")?);
    let chat: Arc<dyn ChatWebhook> = Arc::new(init_chat_webhook(settings)?);

    let composer = MessageComposer {
        recipients: settings.email.recipient_list(),
        calendar_link: settings.reminders.calendar_link.clone(),
        sender_name: settings.email.sender_name.clone(),
    };

    info!(
        sheet = %settings.reminders.sheet,
        offsets = ?settings.reminders.offsets,
        "Reminder scanner initialized"
    );
    Ok(ReminderScanner::new(
        settings.reminders.clone(),
        store,
        provisioner,
        ReminderNotifier::new(composer, mailer, chat),
    ))
}

/// Calendar sync wired to the configured adapters
#[tracing::instrument(skip(settings))]
pub fn build_calendar_sync(settings: &Settings) -> Result<CalendarSync> {
    let store = init_sheet_store(settings, &settings.calendar_sync.sheet)?;
    let calendar: Arc<dyn CalendarService> = Arc::new(GoogleCalendarService::new(
        init_google_client(settings)?,
        settings.google.calendar_api_base.clone(),
        settings.calendar_sync.calendar_id.clone(),
    ));

    info!(sheet = %settings.calendar_sync.sheet, "Calendar sync initialized");
    Ok(CalendarSync::new(
        settings.calendar_sync.clone(),
        store,
        calendar,
    ))
}
