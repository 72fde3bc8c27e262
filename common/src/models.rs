// Data models shared by the reminder and calendar sync jobs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A single cell as read from a sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Render the cell as trimmed text; whole numbers drop their fraction
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

/// Read a 1-based column out of a row, tolerating short rows
pub fn cell_text(row: &[Cell], column: u32) -> String {
    column
        .checked_sub(1)
        .and_then(|idx| row.get(idx as usize))
        .map(Cell::as_text)
        .unwrap_or_default()
}

/// A value written back into a sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Text(String),
    /// Clickable reference showing `label` and pointing at `url`
    Link { url: String, label: String },
}

impl CellValue {
    /// Spreadsheet formula form of a link, plain text otherwise
    pub fn to_formula(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Link { url, label } => format!(
                "=HYPERLINK(\"{}\", \"{}\")",
                url.replace('"', "\"\""),
                label.replace('"', "\"\"")
            ),
        }
    }
}

/// Inclusive date range parsed from a row's date-range text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Ordered, de-duplicated set of offsets already notified for a row
///
/// Tokens are kept verbatim, so hand-edited entries survive a rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SentMarkers {
    entries: Vec<String>,
}

impl SentMarkers {
    pub fn parse(raw: &str) -> Self {
        let mut markers = Self::default();
        for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            markers.push_token(token);
        }
        markers
    }

    fn push_token(&mut self, token: &str) {
        if !self.entries.iter().any(|e| e == token) {
            self.entries.push(token.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, offset: i64) -> bool {
        let token = offset.to_string();
        self.entries.iter().any(|e| *e == token)
    }

    /// Add an offset, keeping first-appearance order
    pub fn insert(&mut self, offset: i64) {
        self.push_token(&offset.to_string());
    }
}

impl fmt::Display for SentMarkers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entries.join(","))
    }
}

/// Everything a reminder notification needs to say
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderNotice {
    pub days: i64,
    pub topic: String,
    pub date_range: String,
    pub doc_link: Option<String>,
}

/// Outgoing plain-text email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Link-shared copy of the template document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionedDocument {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderMethod {
    Popup,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventReminder {
    pub method: ReminderMethod,
    pub minutes: u32,
}

/// All-day calendar entry mirrored from a sheet row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllDayEvent {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub reminders: Vec<EventReminder>,
}

/// A row that could not be processed; the run carried on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowFailure {
    pub row: u32,
    pub reason: String,
}

/// Outcome of one reminder scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub run_id: Uuid,
    pub today: NaiveDate,
    pub rows_scanned: usize,
    pub rows_skipped: usize,
    pub reminders_sent: usize,
    pub documents_provisioned: usize,
    pub delivery_failures: usize,
    pub failures: Vec<RowFailure>,
}

impl ScanReport {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            today,
            rows_scanned: 0,
            rows_skipped: 0,
            reminders_sent: 0,
            documents_provisioned: 0,
            delivery_failures: 0,
            failures: Vec::new(),
        }
    }
}

/// Outcome of one calendar sync
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub rows_scanned: usize,
    pub rows_skipped: usize,
    pub events_created: usize,
    pub failures: Vec<RowFailure>,
}

impl SyncReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            rows_scanned: 0,
            rows_skipped: 0,
            events_created: 0,
            failures: Vec::new(),
        }
    }
}

impl Default for SyncReport {
    fn default() -> Self {
        Self::new()
    }
}
