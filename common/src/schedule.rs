// Schedule parsing and calendar-date helpers
//
// Cron expressions use second precision (`sec min hour dom month dow [year]`)
// and are evaluated in the configured timezone.

use crate::errors::ScheduleError;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use cron::Schedule as CronSchedule;
use std::str::FromStr;

/// Parse and validate a cron expression
pub fn parse_cron_expression(expression: &str) -> Result<CronSchedule, ScheduleError> {
    CronSchedule::from_str(expression).map_err(|e| ScheduleError::InvalidCronExpression {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

/// Calculate the next execution time strictly after `after`, evaluating the
/// expression in `timezone`
pub fn next_execution_after(
    expression: &str,
    timezone: Tz,
    after: DateTime<Utc>,
) -> Result<DateTime<Utc>, ScheduleError> {
    let schedule = parse_cron_expression(expression)?;

    let reference_in_tz = after.with_timezone(&timezone);

    let next_in_tz = schedule
        .after(&reference_in_tz)
        .next()
        .ok_or_else(|| ScheduleError::NoNextExecution(expression.to_string()))?;

    Ok(next_in_tz.with_timezone(&Utc))
}

/// The calendar date of `now` in `timezone`
pub fn date_in(now: DateTime<Utc>, timezone: Tz) -> NaiveDate {
    now.with_timezone(&timezone).date_naive()
}

/// Today's calendar date in `timezone`
pub fn today_in(timezone: Tz) -> NaiveDate {
    date_in(Utc::now(), timezone)
}
