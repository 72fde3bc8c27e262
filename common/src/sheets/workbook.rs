// Local XLSX implementation of the sheet store
//
// Reads go through calamine; each write re-saves the whole workbook with
// rust_xlsxwriter. Cell values and formulas survive a rewrite, styling does not.

use super::{hyperlink_target, SheetStore};
use crate::errors::SheetError;
use crate::models::{Cell, CellValue};
use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Formula, Workbook};
use std::path::PathBuf;
use tracing::{debug, info, instrument};

/// One cell as stored in the workbook
#[derive(Debug, Clone, Default, PartialEq)]
struct StoredCell {
    value: Cell,
    formula: Option<String>,
}

impl StoredCell {
    /// What the jobs see: link targets instead of link labels
    fn visible(&self) -> Cell {
        self.formula
            .as_deref()
            .and_then(hyperlink_target)
            .map(Cell::Text)
            .unwrap_or_else(|| self.value.clone())
    }
}

#[derive(Debug, Clone)]
struct StoredSheet {
    name: String,
    rows: Vec<Vec<StoredCell>>,
}

/// Sheet store backed by a local `.xlsx` file
pub struct WorkbookStore {
    path: PathBuf,
}

impl WorkbookStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<Vec<StoredSheet>, SheetError> {
        let mut workbook = open_workbook_auto(&self.path).map_err(|e| {
            SheetError::Io(format!(
                "Failed to open workbook {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let values = workbook
                .worksheet_range(&name)
                .map_err(|e| SheetError::Io(format!("Failed to read sheet '{}': {}", name, e)))?;
            let formulas = workbook.worksheet_formula(&name).ok();

            let last_row = values
                .end()
                .map(|(r, _)| r)
                .max(formulas.as_ref().and_then(|f| f.end()).map(|(r, _)| r));
            let last_col = values
                .end()
                .map(|(_, c)| c)
                .max(formulas.as_ref().and_then(|f| f.end()).map(|(_, c)| c));

            let mut rows = Vec::new();
            if let (Some(last_row), Some(last_col)) = (last_row, last_col) {
                for r in 0..=last_row {
                    let mut row = Vec::new();
                    for c in 0..=last_col {
                        let value = values.get_value((r, c)).map(data_cell).unwrap_or_default();
                        let formula = formulas
                            .as_ref()
                            .and_then(|f| f.get_value((r, c)))
                            .filter(|f| !f.is_empty())
                            .cloned();
                        row.push(StoredCell { value, formula });
                    }
                    rows.push(row);
                }
            }

            sheets.push(StoredSheet { name, rows });
        }

        Ok(sheets)
    }

    fn save(&self, sheets: &[StoredSheet]) -> Result<(), SheetError> {
        let mut workbook = Workbook::new();

        for sheet in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet
                .set_name(&sheet.name)
                .map_err(|e| SheetError::Io(format!("Invalid sheet name: {}", e)))?;

            for (r, row) in sheet.rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    let row_num = r as u32;
                    let col_num = u16::try_from(c).map_err(|_| SheetError::InvalidAddress {
                        row: row_num + 1,
                        column: c as u32 + 1,
                    })?;

                    let written = if let Some(formula) = &cell.formula {
                        let text = if formula.starts_with('=') {
                            formula.clone()
                        } else {
                            format!("={}", formula)
                        };
                        worksheet
                            .write_formula(
                                row_num,
                                col_num,
                                Formula::new(text).set_result(cell.value.as_text()),
                            )
                            .map(|_| ())
                    } else {
                        match &cell.value {
                            Cell::Empty => Ok(()),
                            Cell::Text(s) => worksheet.write_string(row_num, col_num, s).map(|_| ()),
                            Cell::Number(n) => {
                                worksheet.write_number(row_num, col_num, *n).map(|_| ())
                            }
                            Cell::Bool(b) => {
                                worksheet.write_boolean(row_num, col_num, *b).map(|_| ())
                            }
                        }
                    };
                    written.map_err(|e| {
                        SheetError::Io(format!("Failed to write cell ({}, {}): {}", r, c, e))
                    })?;
                }
            }
        }

        workbook.save(&self.path).map_err(|e| {
            SheetError::Io(format!(
                "Failed to save workbook {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

fn data_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        _ => Cell::Empty,
    }
}

#[async_trait]
impl SheetStore for WorkbookStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn read_rows(&self, sheet: &str) -> Result<Vec<Vec<Cell>>, SheetError> {
        let sheets = self.load()?;
        let found = sheets
            .into_iter()
            .find(|s| s.name == sheet)
            .ok_or_else(|| SheetError::SheetNotFound(sheet.to_string()))?;

        debug!(rows = found.rows.len(), "Loaded sheet from workbook");
        Ok(found
            .rows
            .iter()
            .map(|row| row.iter().map(StoredCell::visible).collect())
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
        if row == 0 || column == 0 {
            return Err(SheetError::InvalidAddress { row, column });
        }

        let mut sheets = self.load()?;
        let target = sheets
            .iter_mut()
            .find(|s| s.name == sheet)
            .ok_or_else(|| SheetError::SheetNotFound(sheet.to_string()))?;

        let (r, c) = ((row - 1) as usize, (column - 1) as usize);
        if target.rows.len() <= r {
            target.rows.resize(r + 1, Vec::new());
        }
        let cells = &mut target.rows[r];
        if cells.len() <= c {
            cells.resize(c + 1, StoredCell::default());
        }

        cells[c] = match value {
            CellValue::Text(text) => StoredCell {
                value: Cell::from(text.as_str()),
                formula: None,
            },
            CellValue::Link { ref label, .. } => StoredCell {
                value: Cell::Text(label.clone()),
                formula: Some(value.to_formula()),
            },
        };

        self.save(&sheets)?;
        info!(sheet = sheet, row = row, column = column, "Workbook cell updated");
        Ok(())
    }
}
