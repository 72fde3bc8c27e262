// Calendar sync: one all-day event per calendar sync row
//
// A non-empty event id cell marks a row as synced. Re-running the job never
// creates a second event for the same row.

use crate::calendar::CalendarService;
use crate::config::CalendarSyncConfig;
use crate::date_range::parse_start_date;
use crate::errors::JobError;
use crate::models::{
    cell_text, AllDayEvent, Cell, CellValue, EventReminder, ReminderMethod, RowFailure, SyncReport,
};
use crate::sheets::SheetStore;
use chrono::NaiveDate;
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct CalendarSync {
    config: CalendarSyncConfig,
    store: Arc<dyn SheetStore>,
    calendar: Arc<dyn CalendarService>,
}

impl CalendarSync {
    pub fn new(
        config: CalendarSyncConfig,
        store: Arc<dyn SheetStore>,
        calendar: Arc<dyn CalendarService>,
    ) -> Self {
        Self {
            config,
            store,
            calendar,
        }
    }

    /// Event description; empty fields show the placeholder
    pub fn describe(&self, row: &[Cell]) -> String {
        let cols = &self.config.columns;
        let field = |column: u32| {
            let value = cell_text(row, column);
            if value.is_empty() {
                self.config.placeholder.clone()
            } else {
                value
            }
        };

        format!(
            "Broad Theme: {}\nType: {}\nLead Magnet: {}\nCopy Link: {}",
            field(cols.broad_theme),
            field(cols.content_type),
            field(cols.lead_magnet),
            field(cols.copy_link),
        )
    }

    fn reminders(&self) -> Vec<EventReminder> {
        vec![
            EventReminder {
                method: ReminderMethod::Popup,
                minutes: self.config.reminder_minutes,
            },
            EventReminder {
                method: ReminderMethod::Email,
                minutes: self.config.reminder_minutes,
            },
        ]
    }

    /// Create events for every unsynced row
    ///
    /// `today` only anchors the year of the row dates.
    #[instrument(skip(self), fields(sheet = %self.config.sheet))]
    pub async fn run(&self, today: NaiveDate) -> Result<SyncReport, JobError> {
        let rows = self.store.read_rows(&self.config.sheet).await?;
        let cols = &self.config.columns;
        let mut report = SyncReport::new();

        for (idx, row) in rows
            .iter()
            .enumerate()
            .skip(self.config.header_rows as usize)
        {
            report.rows_scanned += 1;
            let row_number = idx as u32 + 1;

            let date_text = cell_text(row, cols.date_range);
            let topic = cell_text(row, cols.topic);
            if date_text.is_empty() || topic.is_empty() || !cell_text(row, cols.event_id).is_empty()
            {
                report.rows_skipped += 1;
                continue;
            }

            let Some(date) = parse_start_date(&date_text, today) else {
                debug!(row = row_number, text = %date_text, "Unparseable start date, skipping");
                report.rows_skipped += 1;
                continue;
            };

            let event = AllDayEvent {
                title: topic,
                description: self.describe(row),
                date,
                reminders: self.reminders(),
            };

            let event_id = match self.calendar.create_event(&event).await {
                Ok(id) => id,
                Err(e) => {
                    warn!(row = row_number, title = %event.title, error = %e, "Event creation failed");
                    report.failures.push(RowFailure {
                        row: row_number,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            self.store
                .write_cell(
                    &self.config.sheet,
                    row_number,
                    cols.event_id,
                    CellValue::Text(event_id.clone()),
                )
                .await?;

            counter!("calendar_events_created_total").increment(1);
            report.events_created += 1;
            info!(row = row_number, event_id = %event_id, date = %date, "Row synced to calendar");
        }

        info!(
            run_id = %report.run_id,
            rows_scanned = report.rows_scanned,
            events_created = report.events_created,
            row_failures = report.failures.len(),
            "Calendar sync finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::MockCalendarService;
    use crate::errors::{ProvisioningError, SheetError};
    use crate::sheets::MockSheetStore;
    use mockall::predicate::eq;

    const SHEET: &str = "Calendar Sync";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// A = range, B = theme, C = topic, D = type, E = lead magnet, F = copy, G = event id
    fn row(cells: [&str; 7]) -> Vec<Cell> {
        cells.iter().map(|c| Cell::from(*c)).collect()
    }

    fn sheet(rows: Vec<Vec<Cell>>) -> MockSheetStore {
        let mut data = vec![row([
            "Date", "Theme", "Topic", "Type", "Lead Magnet", "Copy", "Event",
        ])];
        data.extend(rows);
        let mut store = MockSheetStore::new();
        store
            .expect_read_rows()
            .with(eq(SHEET))
            .times(1)
            .returning(move |_| Ok(data.clone()));
        store
    }

    fn sync(store: MockSheetStore, calendar: MockCalendarService) -> CalendarSync {
        CalendarSync::new(
            CalendarSyncConfig::default(),
            Arc::new(store),
            Arc::new(calendar),
        )
    }

    #[test]
    fn test_describe_fills_placeholders() {
        let sync = sync(MockSheetStore::new(), MockCalendarService::new());
        let description = sync.describe(&row(["3/2-10/2", "", "Webinar", "Live", "", "", ""]));
        assert_eq!(
            description,
            "Broad Theme: N/A\nType: Live\nLead Magnet: N/A\nCopy Link: N/A"
        );
    }

    #[tokio::test]
    async fn test_unsynced_row_gets_event_and_id() {
        let mut store = sheet(vec![row([
            "3/2-10/2", "Growth", "Webinar", "Live", "Checklist", "https://copy", "",
        ])]);
        store
            .expect_write_cell()
            .with(
                eq(SHEET),
                eq(2u32),
                eq(7u32),
                eq(CellValue::Text("evt-1".to_string())),
            )
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let mut calendar = MockCalendarService::new();
        calendar
            .expect_create_event()
            .withf(|e: &AllDayEvent| {
                e.title == "Webinar"
                    && e.date == NaiveDate::from_ymd_opt(2025, 2, 3).unwrap()
                    && e.description.starts_with("Broad Theme: Growth\nType: Live")
                    && e.reminders
                        == vec![
                            EventReminder {
                                method: ReminderMethod::Popup,
                                minutes: 2880,
                            },
                            EventReminder {
                                method: ReminderMethod::Email,
                                minutes: 2880,
                            },
                        ]
            })
            .times(1)
            .returning(|_| Ok("evt-1".to_string()));

        let report = sync(store, calendar).run(date(2025, 1, 15)).await.unwrap();
        assert_eq!(report.events_created, 1);
        assert_eq!(report.rows_skipped, 0);
    }

    #[tokio::test]
    async fn test_synced_blank_and_unparseable_rows_are_skipped() {
        let mut store = sheet(vec![
            row(["3/2-10/2", "", "Webinar", "", "", "", "evt-1"]),
            row(["", "", "Webinar", "", "", "", ""]),
            row(["3/2-10/2", "", "", "", "", "", ""]),
            row(["next week", "", "Webinar", "", "", "", ""]),
        ]);
        store.expect_write_cell().times(0);
        let mut calendar = MockCalendarService::new();
        calendar.expect_create_event().times(0);

        let report = sync(store, calendar).run(date(2025, 1, 15)).await.unwrap();
        assert_eq!(report.rows_scanned, 4);
        assert_eq!(report.rows_skipped, 4);
        assert_eq!(report.events_created, 0);
    }

    #[tokio::test]
    async fn test_creation_failure_leaves_row_unsynced() {
        let mut store = sheet(vec![
            row(["3/2-10/2", "", "Webinar", "", "", "", ""]),
            row(["12/2", "", "Newsletter", "", "", "", ""]),
        ]);
        store
            .expect_write_cell()
            .with(
                eq(SHEET),
                eq(3u32),
                eq(7u32),
                eq(CellValue::Text("evt-2".to_string())),
            )
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let mut calendar = MockCalendarService::new();
        calendar
            .expect_create_event()
            .withf(|e: &AllDayEvent| e.title == "Webinar")
            .times(1)
            .returning(|_| Err(ProvisioningError::EventCreationFailed("forbidden".to_string())));
        calendar
            .expect_create_event()
            .withf(|e: &AllDayEvent| e.title == "Newsletter")
            .times(1)
            .returning(|_| Ok("evt-2".to_string()));

        let report = sync(store, calendar).run(date(2025, 1, 15)).await.unwrap();
        assert_eq!(report.events_created, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].row, 2);
    }

    #[tokio::test]
    async fn test_read_failure_aborts_run() {
        let mut store = MockSheetStore::new();
        store
            .expect_read_rows()
            .returning(|name| Err(SheetError::SheetNotFound(name.to_string())));
        let mut calendar = MockCalendarService::new();
        calendar.expect_create_event().times(0);

        let result = sync(store, calendar).run(date(2025, 1, 15)).await;
        assert!(matches!(result, Err(JobError::Sheet(SheetError::SheetNotFound(_)))));
    }
}
