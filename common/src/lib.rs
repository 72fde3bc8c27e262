// Common library shared by the worker and scheduler binaries

pub mod bootstrap;
pub mod calendar;
pub mod calendar_sync;
pub mod config;
pub mod date_range;
pub mod documents;
pub mod errors;
pub mod google;
pub mod models;
pub mod notify;
pub mod reminders;
pub mod schedule;
pub mod scheduler;
pub mod sheets;
pub mod telemetry;
