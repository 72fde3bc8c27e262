// Date-range parsing for content calendar rows
//
// Rows carry free text such as `20/1-26/1` or `20/1 - 26/1` (day/month).
// Both dates are anchored to the year of `today`; a December → January range
// therefore yields an end date before its start date.

use crate::models::DateRange;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

fn range_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d{1,2})\s*/\s*(\d{1,2})\s*-\s*(\d{1,2})\s*/\s*(\d{1,2})")
            .expect("date range pattern is valid")
    })
}

fn anchored(year: i32, day: &str, month: &str) -> Option<NaiveDate> {
    let day: u32 = day.trim().parse().ok()?;
    let month: u32 = month.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse `day/month - day/month` anywhere in `text`
///
/// Returns `None` when the pattern is absent or either side is not a real
/// calendar date in the anchor year.
pub fn parse_date_range(text: &str, today: NaiveDate) -> Option<DateRange> {
    let caps = range_pattern().captures(text)?;
    let year = today.year();

    let start = anchored(year, &caps[1], &caps[2])?;
    let end = anchored(year, &caps[3], &caps[4])?;

    Some(DateRange { start, end })
}

/// Extract only the start date: split on the first `-`, then on `/`
pub fn parse_start_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let left = text.split('-').next()?;
    let mut parts = left.split('/');
    let day = parts.next()?;
    let month = parts.next()?;

    anchored(today.year(), day, month)
}
