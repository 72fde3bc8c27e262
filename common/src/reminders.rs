// Reminder scanner: fires day-offset reminders for content calendar rows
//
// Every offset fires at most once per row. The offsets already fired live in
// the row itself (sent-markers cell), as does the provisioned document link.

use crate::config::ReminderConfig;
use crate::date_range::parse_date_range;
use crate::documents::DocumentProvisioner;
use crate::errors::JobError;
use crate::models::{
    cell_text, Cell, CellValue, DateRange, ReminderNotice, RowFailure, ScanReport, SentMarkers,
};
use crate::notify::ReminderNotifier;
use crate::sheets::SheetStore;
use chrono::NaiveDate;
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Date a row's countdown is measured against
///
/// A row whose start already passed counts down to its end instead, but only
/// until its first reminder fires.
pub fn reference_date(range: &DateRange, today: NaiveDate, markers: &SentMarkers) -> NaiveDate {
    if range.start < today && markers.is_empty() {
        range.end
    } else {
        range.start
    }
}

/// The offset due today, if it is configured and not yet sent
pub fn due_offset(
    range: &DateRange,
    today: NaiveDate,
    markers: &SentMarkers,
    offsets: &[i64],
) -> Option<i64> {
    let days = (reference_date(range, today, markers) - today).num_days();
    if offsets.contains(&days) && !markers.contains(days) {
        Some(days)
    } else {
        None
    }
}

pub struct ReminderScanner {
    config: ReminderConfig,
    store: Arc<dyn SheetStore>,
    provisioner: DocumentProvisioner,
    notifier: ReminderNotifier,
}

impl ReminderScanner {
    pub fn new(
        config: ReminderConfig,
        store: Arc<dyn SheetStore>,
        provisioner: DocumentProvisioner,
        notifier: ReminderNotifier,
    ) -> Self {
        Self {
            config,
            store,
            provisioner,
            notifier,
        }
    }

    /// Scan every data row once
    ///
    /// Only sheet store failures abort the run; everything else is recorded in
    /// the returned report.
    #[instrument(skip(self), fields(sheet = %self.config.sheet))]
    pub async fn run(&self, today: NaiveDate) -> Result<ScanReport, JobError> {
        let rows = self.store.read_rows(&self.config.sheet).await?;
        let mut report = ScanReport::new(today);

        for (idx, row) in rows
            .iter()
            .enumerate()
            .skip(self.config.header_rows as usize)
        {
            report.rows_scanned += 1;
            let row_number = idx as u32 + 1;
            if !self.process_row(row_number, row, today, &mut report).await? {
                report.rows_skipped += 1;
            }
        }

        info!(
            run_id = %report.run_id,
            rows_scanned = report.rows_scanned,
            reminders_sent = report.reminders_sent,
            documents_provisioned = report.documents_provisioned,
            delivery_failures = report.delivery_failures,
            row_failures = report.failures.len(),
            "Reminder scan finished"
        );
        Ok(report)
    }

    /// Returns `Ok(true)` when a reminder fired for the row
    async fn process_row(
        &self,
        row_number: u32,
        row: &[Cell],
        today: NaiveDate,
        report: &mut ScanReport,
    ) -> Result<bool, JobError> {
        let cols = &self.config.columns;
        let date_range = cell_text(row, cols.date_range);
        let topic = cell_text(row, cols.topic);
        if date_range.is_empty() || topic.is_empty() {
            return Ok(false);
        }

        let Some(range) = parse_date_range(&date_range, today) else {
            debug!(row = row_number, text = %date_range, "Unparseable date range, skipping");
            return Ok(false);
        };

        let mut markers = SentMarkers::parse(&cell_text(row, cols.sent));
        let Some(days) = due_offset(&range, today, &markers, &self.config.offsets) else {
            return Ok(false);
        };

        let mut doc_link = Some(cell_text(row, cols.doc_link)).filter(|l| !l.is_empty());

        if days == self.config.document_offset && doc_link.is_none() {
            match self.provisioner.provision(&date_range, &topic).await {
                Ok(url) => {
                    self.store
                        .write_cell(
                            &self.config.sheet,
                            row_number,
                            cols.doc_link,
                            CellValue::Link {
                                url: url.clone(),
                                label: self.config.doc_link_label.clone(),
                            },
                        )
                        .await?;
                    report.documents_provisioned += 1;
                    doc_link = Some(url);
                }
                Err(e) => {
                    warn!(row = row_number, topic = %topic, error = %e, "Document provisioning failed, row left untouched");
                    report.failures.push(RowFailure {
                        row: row_number,
                        reason: e.to_string(),
                    });
                    return Ok(false);
                }
            }
        }

        let notice = ReminderNotice {
            days,
            topic,
            date_range,
            doc_link,
        };
        let outcome = self.notifier.notify(&notice).await;
        report.delivery_failures += outcome.failures();

        markers.insert(days);
        self.store
            .write_cell(
                &self.config.sheet,
                row_number,
                cols.sent,
                CellValue::Text(markers.to_string()),
            )
            .await?;

        counter!("reminders_sent_total").increment(1);
        report.reminders_sent += 1;
        info!(row = row_number, topic = %notice.topic, days_to_go = days, "Reminder fired");
        Ok(true)
    }
}
