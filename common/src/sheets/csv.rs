// CSV implementation of the sheet store
//
// A CSV file holds exactly one sheet, so the sheet name is only checked
// against the configured one. Links are stored as their target URL.

use super::SheetStore;
use crate::errors::SheetError;
use crate::models::{Cell, CellValue};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

pub struct CsvStore {
    path: PathBuf,
    sheet_name: Option<String>,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheet_name: None,
        }
    }

    /// Only answer for `sheet_name`; any other sheet is reported missing
    pub fn with_sheet_name(mut self, sheet_name: impl Into<String>) -> Self {
        self.sheet_name = Some(sheet_name.into());
        self
    }

    fn check_sheet(&self, sheet: &str) -> Result<(), SheetError> {
        match &self.sheet_name {
            Some(name) if name != sheet => Err(SheetError::SheetNotFound(sheet.to_string())),
            _ => Ok(()),
        }
    }

    fn load(&self) -> Result<Vec<Vec<String>>, SheetError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| {
                SheetError::Io(format!("Failed to open {}: {}", self.path.display(), e))
            })?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| SheetError::Io(format!("Failed to parse CSV record: {}", e)))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }

    fn save(&self, rows: &[Vec<String>]) -> Result<(), SheetError> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| {
                SheetError::Io(format!("Failed to create {}: {}", self.path.display(), e))
            })?;

        for row in rows {
            writer
                .write_record(row)
                .map_err(|e| SheetError::Io(format!("Failed to write CSV record: {}", e)))?;
        }
        writer
            .flush()
            .map_err(|e| SheetError::Io(format!("Failed to flush CSV: {}", e)))
    }
}

#[async_trait]
impl SheetStore for CsvStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn read_rows(&self, sheet: &str) -> Result<Vec<Vec<Cell>>, SheetError> {
        self.check_sheet(sheet)?;
        Ok(self
            .load()?
            .iter()
            .map(|row| row.iter().map(|v| Cell::from(v.as_str())).collect())
            .collect())
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    async fn write_cell(
        &self,
        sheet: &str,
        row: u32,
        column: u32,
        value: CellValue,
    ) -> Result<(), SheetError> {
        self.check_sheet(sheet)?;
        if row == 0 || column == 0 {
            return Err(SheetError::InvalidAddress { row, column });
        }

        let mut rows = self.load()?;
        let (r, c) = ((row - 1) as usize, (column - 1) as usize);
        if rows.len() <= r {
            rows.resize(r + 1, Vec::new());
        }
        if rows[r].len() <= c {
            rows[r].resize(c + 1, String::new());
        }

        rows[r][c] = match value {
            CellValue::Text(text) => text,
            CellValue::Link { url, label } => {
                warn!(label = %label, "CSV cannot hold links, storing the URL");
                url
            }
        };

        self.save(&rows)?;
        info!(row = row, column = column, "CSV cell updated");
        Ok(())
    }
}
