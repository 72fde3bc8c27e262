// Configuration management with layered configuration (file, env)

use crate::errors::ValidationError;
use crate::schedule::parse_cron_expression;
use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use lettre::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// IANA timezone used to decide what "today" is
    pub timezone: String,
    pub sheets: SheetsConfig,
    pub reminders: ReminderConfig,
    pub calendar_sync: CalendarSyncConfig,
    pub email: EmailConfig,
    pub chat: ChatConfig,
    pub google: GoogleConfig,
    pub schedule: ScheduleConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetBackend {
    Google,
    Xlsx,
    Csv,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub backend: SheetBackend,
    /// Spreadsheet id for the `google` backend
    pub spreadsheet_id: Option<String>,
    /// Local file for the `xlsx` and `csv` backends
    pub path: Option<String>,
}

/// 1-based column positions used by the reminder job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderColumns {
    pub date_range: u32,
    pub topic: u32,
    pub sent: u32,
    pub doc_link: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    pub sheet: String,
    pub header_rows: u32,
    pub columns: ReminderColumns,
    /// Day offsets that fire a reminder, in firing order
    pub offsets: Vec<i64>,
    /// Offset on which the content document gets provisioned
    pub document_offset: i64,
    pub template_doc_id: String,
    /// Link to the content calendar itself, quoted in every notification
    pub calendar_link: String,
    pub doc_link_label: String,
}

/// 1-based column positions used by the calendar sync job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncColumns {
    pub date_range: u32,
    pub broad_theme: u32,
    pub topic: u32,
    pub content_type: u32,
    pub lead_magnet: u32,
    pub copy_link: u32,
    pub event_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSyncConfig {
    pub sheet: String,
    pub header_rows: u32,
    pub columns: SyncColumns,
    pub calendar_id: String,
    /// Lead time of both event reminders
    pub reminder_minutes: u32,
    /// Stand-in for empty descriptive fields in the event body
    pub placeholder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    /// Comma-separated distribution list
    pub recipients: String,
    pub sender_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub webhook_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// Bearer token provided by the host platform
    pub access_token: String,
    pub sheets_api_base: String,
    pub drive_api_base: String,
    pub calendar_api_base: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub reminders_enabled: bool,
    pub reminders_cron: String,
    pub calendar_sync_enabled: bool,
    pub calendar_sync_cron: String,
    pub poll_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub json_logs: bool,
    pub metrics_port: Option<u16>,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Resolve the configured timezone
    pub fn tz(&self) -> Result<Tz, ValidationError> {
        Tz::from_str(&self.timezone).map_err(|e| ValidationError::InvalidFieldValue {
            field: "timezone".to_string(),
            reason: e.to_string(),
        })
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.tz()?;

        match self.sheets.backend {
            SheetBackend::Google => {
                if self.sheets.spreadsheet_id.as_deref().unwrap_or("").is_empty() {
                    return Err(ValidationError::MissingField(
                        "sheets.spreadsheet_id".to_string(),
                    ));
                }
            }
            SheetBackend::Xlsx | SheetBackend::Csv => {
                if self.sheets.path.as_deref().unwrap_or("").is_empty() {
                    return Err(ValidationError::MissingField("sheets.path".to_string()));
                }
            }
        }

        // Reminder job
        if self.reminders.sheet.is_empty() {
            return Err(ValidationError::MissingField("reminders.sheet".to_string()));
        }
        let cols = &self.reminders.columns;
        validate_columns(
            "reminders.columns",
            &[cols.date_range, cols.topic, cols.sent, cols.doc_link],
        )?;
        if self.reminders.offsets.is_empty() {
            return Err(invalid("reminders.offsets", "must not be empty"));
        }
        let mut seen = HashSet::new();
        for offset in &self.reminders.offsets {
            if *offset <= 0 {
                return Err(invalid("reminders.offsets", "offsets must be positive"));
            }
            if !seen.insert(*offset) {
                return Err(invalid(
                    "reminders.offsets",
                    &format!("duplicate offset {}", offset),
                ));
            }
        }
        if !self.reminders.offsets.contains(&self.reminders.document_offset) {
            return Err(invalid(
                "reminders.document_offset",
                "must be one of reminders.offsets",
            ));
        }
        if self.reminders.template_doc_id.is_empty() {
            return Err(ValidationError::MissingField(
                "reminders.template_doc_id".to_string(),
            ));
        }

        // Calendar sync job
        if self.calendar_sync.sheet.is_empty() {
            return Err(ValidationError::MissingField(
                "calendar_sync.sheet".to_string(),
            ));
        }
        let cols = &self.calendar_sync.columns;
        validate_columns(
            "calendar_sync.columns",
            &[
                cols.date_range,
                cols.broad_theme,
                cols.topic,
                cols.content_type,
                cols.lead_magnet,
                cols.copy_link,
                cols.event_id,
            ],
        )?;
        if self.calendar_sync.reminder_minutes == 0 {
            return Err(invalid(
                "calendar_sync.reminder_minutes",
                "must be greater than 0",
            ));
        }
        if self.calendar_sync.calendar_id.is_empty() {
            return Err(ValidationError::MissingField(
                "calendar_sync.calendar_id".to_string(),
            ));
        }

        // Notification channels
        let recipients = self.email.recipient_list();
        if recipients.is_empty() {
            return Err(ValidationError::MissingField("email.recipients".to_string()));
        }
        for recipient in &recipients {
            Address::from_str(recipient).map_err(|e| {
                invalid(
                    "email.recipients",
                    &format!("'{}' is not an email address: {}", recipient, e),
                )
            })?;
        }
        if self.email.smtp_host.is_empty() {
            return Err(ValidationError::MissingField("email.smtp_host".to_string()));
        }
        if self.email.from.is_empty() {
            return Err(ValidationError::MissingField("email.from".to_string()));
        }
        Address::from_str(self.email.from.trim())
            .map_err(|e| invalid("email.from", &e.to_string()))?;
        reqwest::Url::parse(&self.chat.webhook_url)
            .map_err(|e| invalid("chat.webhook_url", &e.to_string()))?;

        // Schedule
        parse_cron_expression(&self.schedule.reminders_cron)
            .map_err(|e| invalid("schedule.reminders_cron", &e.to_string()))?;
        parse_cron_expression(&self.schedule.calendar_sync_cron)
            .map_err(|e| invalid("schedule.calendar_sync_cron", &e.to_string()))?;
        if self.schedule.poll_interval_seconds == 0 {
            return Err(invalid(
                "schedule.poll_interval_seconds",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl EmailConfig {
    /// Split the comma-separated recipient list
    pub fn recipient_list(&self) -> Vec<String> {
        self.recipients
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn invalid(field: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidFieldValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_columns(field: &str, columns: &[u32]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for column in columns {
        if *column == 0 {
            return Err(invalid(field, "column indices are 1-based"));
        }
        if !seen.insert(*column) {
            return Err(invalid(field, &format!("column {} used twice", column)));
        }
    }
    Ok(())
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            sheets: SheetsConfig::default(),
            reminders: ReminderConfig::default(),
            calendar_sync: CalendarSyncConfig::default(),
            email: EmailConfig::default(),
            chat: ChatConfig::default(),
            google: GoogleConfig::default(),
            schedule: ScheduleConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            backend: SheetBackend::Google,
            spreadsheet_id: Some("CONTENT_CALENDAR_SPREADSHEET_ID".to_string()),
            path: None,
        }
    }
}

impl Default for ReminderColumns {
    fn default() -> Self {
        Self {
            date_range: 2,
            topic: 4,
            sent: 7,
            doc_link: 8,
        }
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            sheet: "Content Calendar".to_string(),
            header_rows: 1,
            columns: ReminderColumns::default(),
            offsets: vec![5, 3, 1],
            document_offset: 5,
            template_doc_id: "CONTENT_DOC_TEMPLATE_ID".to_string(),
            calendar_link: "https://docs.google.com/spreadsheets/".to_string(),
            doc_link_label: "Content Doc".to_string(),
        }
    }
}

impl Default for SyncColumns {
    fn default() -> Self {
        Self {
            date_range: 1,
            broad_theme: 2,
            topic: 3,
            content_type: 4,
            lead_magnet: 5,
            copy_link: 6,
            event_id: 7,
        }
    }
}

impl Default for CalendarSyncConfig {
    fn default() -> Self {
        Self {
            sheet: "Calendar Sync".to_string(),
            header_rows: 1,
            columns: SyncColumns::default(),
            calendar_id: "primary".to_string(),
            reminder_minutes: 2880,
            placeholder: "N/A".to_string(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from: "content-bot@yourcompany.com".to_string(),
            recipients: "email1@yourcompany.com,email2@yourcompany.com".to_string(),
            sender_name: "Content Team".to_string(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            webhook_url: "https://hooks.slack.com/services/YOUR/SLACK/WEBHOOK".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            sheets_api_base: "https://sheets.googleapis.com".to_string(),
            drive_api_base: "https://www.googleapis.com".to_string(),
            calendar_api_base: "https://www.googleapis.com".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            reminders_enabled: true,
            reminders_cron: "0 0 8 * * * *".to_string(),
            calendar_sync_enabled: true,
            calendar_sync_cron: "0 0 * * * * *".to_string(),
            poll_interval_seconds: 30,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: true,
            metrics_port: None,
        }
    }
}
