// Error handling framework
// One enum per failure class; the jobs decide which classes abort a run.

use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },
}

/// Schedule-related errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCronExpression { expression: String, reason: String },

    #[error("No next execution time available for '{0}'")]
    NoNextExecution(String),
}

/// Spreadsheet store errors
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Invalid cell address row {row}, column {column}")]
    InvalidAddress { row: u32, column: u32 },

    #[error("Sheet request failed: {0}")]
    RequestFailed(String),

    #[error("Unexpected sheet response: {0}")]
    InvalidResponse(String),

    #[error("Workbook I/O failed: {0}")]
    Io(String),
}

/// Notification delivery errors (email, chat)
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    MessageBuild(String),

    #[error("Mail transport failed: {0}")]
    Transport(String),

    #[error("Webhook request failed: {0}")]
    Webhook(String),

    #[error("Webhook returned status {status}: {body}")]
    WebhookStatus { status: u16, body: String },
}

/// Document and calendar provisioning errors
#[derive(Error, Debug)]
pub enum ProvisioningError {
    #[error("Document copy failed: {0}")]
    CopyFailed(String),

    #[error("Document sharing failed: {0}")]
    ShareFailed(String),

    #[error("Calendar event creation failed: {0}")]
    EventCreationFailed(String),

    #[error("Service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected service response: {0}")]
    InvalidResponse(String),
}

/// Errors that abort a whole job run
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Sheet store error: {0}")]
    Sheet(#[from] SheetError),
}
