// Integration tests for the file-backed sheet stores (xlsx, csv)

use common::errors::SheetError;
use common::models::{cell_text, Cell, CellValue};
use common::sheets::{CsvStore, SheetStore, WorkbookStore};
use rust_xlsxwriter::Workbook;
use std::path::Path;

fn write_calendar_workbook(path: &Path) {
    let mut workbook = Workbook::new();

    let calendar = workbook.add_worksheet();
    calendar.set_name("Content Calendar").unwrap();
    for (c, header) in ["Week", "Date Range", "Owner", "Topic", "Channel", "Status", "Sent", "Doc"]
        .iter()
        .enumerate()
    {
        calendar.write_string(0, c as u16, *header).unwrap();
    }
    calendar.write_string(1, 0, "W4").unwrap();
    calendar.write_string(1, 1, "20/1 - 26/1").unwrap();
    calendar.write_string(1, 3, "Launch").unwrap();
    calendar.write_number(2, 0, 5.0).unwrap();
    calendar.write_string(2, 3, "Recap").unwrap();

    let sync = workbook.add_worksheet();
    sync.set_name("Calendar Sync").unwrap();
    sync.write_string(0, 0, "Date").unwrap();
    sync.write_string(1, 0, "3/2-10/2").unwrap();

    workbook.save(path).unwrap();
}

#[tokio::test]
async fn test_workbook_reads_named_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calendar.xlsx");
    write_calendar_workbook(&path);

    let store = WorkbookStore::new(&path);
    let rows = store.read_rows("Content Calendar").await.unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(cell_text(&rows[1], 2), "20/1 - 26/1");
    assert_eq!(cell_text(&rows[1], 4), "Launch");
    assert_eq!(cell_text(&rows[2], 1), "5");
    assert_eq!(cell_text(&rows[1], 7), "");
}

#[tokio::test]
async fn test_workbook_missing_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calendar.xlsx");
    write_calendar_workbook(&path);

    let store = WorkbookStore::new(&path);
    assert!(matches!(
        store.read_rows("Archive").await,
        Err(SheetError::SheetNotFound(name)) if name == "Archive"
    ));
}

#[tokio::test]
async fn test_workbook_writes_survive_reload_with_link_targets() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calendar.xlsx");
    write_calendar_workbook(&path);

    let store = WorkbookStore::new(&path);
    store
        .write_cell(
            "Content Calendar",
            2,
            8,
            CellValue::Link {
                url: "https://docs.example.com/d/abc".to_string(),
                label: "Content Doc".to_string(),
            },
        )
        .await
        .unwrap();
    store
        .write_cell("Content Calendar", 2, 7, CellValue::Text("5".to_string()))
        .await
        .unwrap();

    // A fresh store sees the link target, not the label
    let rows = WorkbookStore::new(&path)
        .read_rows("Content Calendar")
        .await
        .unwrap();
    assert_eq!(cell_text(&rows[1], 8), "https://docs.example.com/d/abc");
    assert_eq!(cell_text(&rows[1], 7), "5");
    assert_eq!(cell_text(&rows[1], 4), "Launch");

    // Other sheets are carried over by the rewrite
    let sync = store.read_rows("Calendar Sync").await.unwrap();
    assert_eq!(cell_text(&sync[1], 1), "3/2-10/2");
}

#[tokio::test]
async fn test_workbook_rejects_zero_address() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calendar.xlsx");
    write_calendar_workbook(&path);

    let result = WorkbookStore::new(&path)
        .write_cell("Content Calendar", 0, 3, CellValue::Text("x".to_string()))
        .await;
    assert!(matches!(
        result,
        Err(SheetError::InvalidAddress { row: 0, column: 3 })
    ));
}

#[tokio::test]
async fn test_workbook_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = WorkbookStore::new(dir.path().join("absent.xlsx"));
    assert!(matches!(
        store.read_rows("Content Calendar").await,
        Err(SheetError::Io(_))
    ));
}

#[tokio::test]
async fn test_csv_round_trip_keeps_marker_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Content Calendar.csv");
    std::fs::write(
        &path,
        "Week,Date Range,Owner,Topic,Channel,Status,Sent,Doc\nW4,20/1-26/1,,Launch,,,5,\n",
    )
    .unwrap();

    let store = CsvStore::new(&path).with_sheet_name("Content Calendar");
    store
        .write_cell("Content Calendar", 2, 7, CellValue::Text("5,3".to_string()))
        .await
        .unwrap();
    store
        .write_cell(
            "Content Calendar",
            2,
            8,
            CellValue::Link {
                url: "https://docs.example.com/d/abc".to_string(),
                label: "Content Doc".to_string(),
            },
        )
        .await
        .unwrap();

    let rows = store.read_rows("Content Calendar").await.unwrap();
    assert_eq!(rows[1][6], Cell::Text("5,3".to_string()));
    assert_eq!(cell_text(&rows[1], 8), "https://docs.example.com/d/abc");
    assert_eq!(rows[0].len(), 8);
}
