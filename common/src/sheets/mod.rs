// Spreadsheet store: bulk row reads and single-cell writes
//
// Rows and columns are 1-based everywhere in this module, matching the
// configured column positions.

pub mod csv;
pub mod google;
pub mod workbook;

pub use self::csv::CsvStore;
pub use google::GoogleSheetsStore;
pub use workbook::WorkbookStore;

use crate::errors::SheetError;
use crate::models::{Cell, CellValue};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

/// Tabular store holding the content calendar
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Read every row of `sheet`, header rows included
    async fn read_rows(&self, sheet: &str) -> Result<Vec<Vec<Cell>>, SheetError>;

    /// Overwrite one cell
    async fn write_cell(
        &self,
        sheet: &str,
        row: u32,
        column: u32,
        value: CellValue,
    ) -> Result<(), SheetError>;
}

/// Convert a 1-based column index into its letter form (1 → A, 27 → AA)
pub fn column_letter(column: u32) -> String {
    let mut n = column;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A1 reference of a single cell, sheet-qualified
pub fn a1_cell(sheet: &str, row: u32, column: u32) -> Result<String, SheetError> {
    if row == 0 || column == 0 {
        return Err(SheetError::InvalidAddress { row, column });
    }
    Ok(format!(
        "{}!{}{}",
        quote_sheet_name(sheet),
        column_letter(column),
        row
    ))
}

/// Quote a sheet name for use in an A1 range
pub fn quote_sheet_name(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

fn hyperlink_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)^\s*=?\s*HYPERLINK\(\s*"((?:[^"]|"")*)""#)
            .expect("Invalid regex pattern")
    })
}

/// Extract the target of a `HYPERLINK("url", "label")` formula
pub fn hyperlink_target(formula: &str) -> Option<String> {
    hyperlink_pattern()
        .captures(formula)
        .map(|caps| caps[1].replace("\"\"", "\""))
}
