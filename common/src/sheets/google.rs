// Google Sheets (v4 REST) implementation of the sheet store

use super::{a1_cell, hyperlink_target, quote_sheet_name, SheetStore};
use crate::errors::SheetError;
use crate::google::{check_status, endpoint, GoogleClient};
use crate::models::{Cell, CellValue};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Sheet store backed by a Google spreadsheet
pub struct GoogleSheetsStore {
    client: GoogleClient,
    api_base: String,
    spreadsheet_id: String,
}

impl GoogleSheetsStore {
    pub fn new(
        client: GoogleClient,
        api_base: impl Into<String>,
        spreadsheet_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    fn values_url(&self, range: &str) -> Result<reqwest::Url, SheetError> {
        endpoint(
            &self.api_base,
            &["v4", "spreadsheets", &self.spreadsheet_id, "values", range],
        )
        .map_err(SheetError::RequestFailed)
    }

    async fn fetch(&self, range: &str, render: &str) -> Result<Vec<Vec<Value>>, SheetError> {
        let url = self.values_url(range)?;
        let response = self
            .client
            .get(url)
            .query(&[("majorDimension", "ROWS"), ("valueRenderOption", render)])
            .send()
            .await
            .map_err(|e| SheetError::RequestFailed(format!("Values request failed: {}", e)))?;

        let response = check_status(response).await.map_err(|(status, body)| {
            if status == 404 || (status == 400 && body.contains("Unable to parse range")) {
                SheetError::SheetNotFound(range.to_string())
            } else {
                SheetError::RequestFailed(format!("status {}: {}", status, body))
            }
        })?;

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| SheetError::InvalidResponse(e.to_string()))?;
        Ok(range.values)
    }
}

fn json_cell(value: &Value) -> Cell {
    match value {
        Value::String(s) if s.is_empty() => Cell::Empty,
        Value::String(s) => Cell::Text(s.clone()),
        Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or_default(),
        Value::Bool(b) => Cell::Bool(*b),
        _ => Cell::Empty,
    }
}

/// Overlay link targets recovered from formulas onto the displayed values
fn merge_rows(values: Vec<Vec<Value>>, formulas: &[Vec<Value>]) -> Vec<Vec<Cell>> {
    values
        .iter()
        .enumerate()
        .map(|(r, row)| {
            let mut cells: Vec<Cell> = row.iter().map(json_cell).collect();
            if let Some(formula_row) = formulas.get(r) {
                for (c, formula) in formula_row.iter().enumerate() {
                    let Some(target) = formula.as_str().and_then(hyperlink_target) else {
                        continue;
                    };
                    if cells.len() <= c {
                        cells.resize(c + 1, Cell::Empty);
                    }
                    cells[c] = Cell::Text(target);
                }
            }
            cells
        })
        .collect()
}

#[async_trait]
impl SheetStore for GoogleSheetsStore {
    #[instrument(skip(self))]
    async fn read_rows(&self, sheet: &str) -> Result<Vec<Vec<Cell>>, SheetError> {
        let range = quote_sheet_name(sheet);
        let values = self.fetch(&range, "FORMATTED_VALUE").await?;
        let formulas = self.fetch(&range, "FORMULA").await?;

        debug!(rows = values.len(), "Fetched sheet values");
        Ok(merge_rows(values, &formulas))
    }

    #[instrument(skip(self, value))]
    async fn write_cell(
        &self,
        sheet: &str,
        row: u32,
        column: u32,
        value: CellValue,
    ) -> Result<(), SheetError> {
        let range = a1_cell(sheet, row, column)?;
        let url = self.values_url(&range)?;

        // Links go through the formula parser; plain text is stored verbatim
        let input_option = match value {
            CellValue::Text(_) => "RAW",
            CellValue::Link { .. } => "USER_ENTERED",
        };

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [[value.to_formula()]],
        });

        let response = self
            .client
            .put(url)
            .query(&[("valueInputOption", input_option)])
            .json(&body)
            .send()
            .await
            .map_err(|e| SheetError::RequestFailed(format!("Cell update failed: {}", e)))?;

        check_status(response).await.map_err(|(status, body)| {
            SheetError::RequestFailed(format!("Cell update status {}: {}", status, body))
        })?;

        debug!(range = %range, "Cell updated");
        Ok(())
    }
}
