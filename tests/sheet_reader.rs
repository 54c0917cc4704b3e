use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use sheet2db::ingestion::{open_sheet, open_xlsx, StreamingSheet};
use sheet2db::LoadError;

type Rows = Vec<Vec<(String, Option<String>)>>;

fn tmp_file(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("sheet2db-{name}-{nanos}.xlsx"))
}

/// Two title rows, then a header row and three data rows, all shifted right by an index column.
///
/// ```text
///   | A   | B     | C    | D
/// 1 | Inventory report
/// 2 | generated 2024-01-01
/// 3 | #   | Item  | Qty  | Note
/// 4 | 1   | Bolt  | 100  |
/// 5 | 2   |       |      |
/// 6 | 3   | Nut   | 250  | bulk
/// ```
fn write_inventory_xlsx(path: &PathBuf) {
    use rust_xlsxwriter::Workbook;

    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("Inventory").unwrap();

    ws.write_string(0, 0, "Inventory report").unwrap();
    ws.write_string(1, 0, "generated 2024-01-01").unwrap();

    ws.write_string(2, 0, "#").unwrap();
    ws.write_string(2, 1, "Item").unwrap();
    ws.write_string(2, 2, "Qty").unwrap();
    ws.write_string(2, 3, "Note").unwrap();

    ws.write_number(3, 0, 1).unwrap();
    ws.write_string(3, 1, "Bolt").unwrap();
    ws.write_number(3, 2, 100).unwrap();

    ws.write_number(4, 0, 2).unwrap();

    ws.write_number(5, 0, 3).unwrap();
    ws.write_string(5, 1, "Nut").unwrap();
    ws.write_number(5, 2, 250).unwrap();
    ws.write_string(5, 3, "bulk").unwrap();

    wb.save(path).unwrap();
}

/// Header `What | When | Took`: a date, a date-time and a duration beyond 24 hours.
fn write_dates_xlsx(path: &PathBuf) {
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    let date = Format::new().set_num_format("yyyy-mm-dd");
    let stamp = Format::new().set_num_format("yyyy-mm-dd hh:mm");
    let hours = Format::new().set_num_format("[h]:mm:ss");

    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.write_string(0, 0, "What").unwrap();
    ws.write_string(0, 1, "When").unwrap();
    ws.write_string(0, 2, "Took").unwrap();

    let day = ExcelDateTime::from_ymd(2024, 1, 15).unwrap();
    let standup = ExcelDateTime::from_ymd(2024, 1, 15)
        .unwrap()
        .and_hms(9, 30, 0)
        .unwrap();
    let took = ExcelDateTime::from_hms(36, 30, 0).unwrap();

    ws.write_string(1, 0, "release").unwrap();
    ws.write_datetime_with_format(1, 1, &day, &date).unwrap();
    ws.write_datetime_with_format(1, 2, &took, &hours).unwrap();
    ws.write_string(2, 0, "standup").unwrap();
    ws.write_datetime_with_format(2, 1, &standup, &stamp).unwrap();

    wb.save(path).unwrap();
}

/// Header `Name` followed by a blank header cell; the data row fills both columns.
fn write_blank_trailing_header_xlsx(path: &PathBuf) {
    use rust_xlsxwriter::Workbook;

    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.write_string(0, 0, "Name").unwrap();
    ws.write_string(1, 0, "Ada").unwrap();
    ws.write_string(1, 1, "x").unwrap();
    wb.save(path).unwrap();
}

fn collect_rows(sheet: &sheet2db::ingestion::Sheet) -> Rows {
    sheet
        .rows()
        .map(|cells| cells.map(|(h, v)| (h.to_string(), v)).collect())
        .collect()
}

fn read_streamed(path: &PathBuf, sheet: &str, skip_rows: u32, skip_cols: u32) -> (Vec<String>, Rows) {
    let mut workbook = open_xlsx(path).unwrap();
    let mut sheet = StreamingSheet::open(&mut workbook, sheet, skip_rows, skip_cols).unwrap();
    let headers = sheet.headers().to_vec();
    let rows = sheet
        .rows()
        .map(|row| row.unwrap().map(|(h, v)| (h.to_string(), v)).collect())
        .collect();
    (headers, rows)
}

fn read_decoded(path: &PathBuf, sheet: &str, skip_rows: u32, skip_cols: u32) -> (Vec<String>, Rows) {
    let sheet = open_sheet(path, sheet, skip_rows, skip_cols).unwrap();
    (sheet.headers().to_vec(), collect_rows(&sheet))
}

#[test]
fn skip_rows_and_cols_remove_exactly_those_cells() {
    let path = tmp_file("inventory");
    write_inventory_xlsx(&path);

    let sheet = open_sheet(&path, "Inventory", 2, 1).unwrap();
    assert_eq!(sheet.name(), "Inventory");
    assert_eq!(sheet.headers(), &["Item", "Qty", "Note"]);

    let rows = collect_rows(&sheet);
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[0],
        vec![
            ("Item".to_string(), Some("Bolt".to_string())),
            ("Qty".to_string(), Some("100".to_string())),
            ("Note".to_string(), None),
        ]
    );
    assert!(rows[1].iter().all(|(_, v)| v.is_none()));
    assert_eq!(rows[2][2], ("Note".to_string(), Some("bulk".to_string())));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn without_skips_the_first_row_is_the_header() {
    let path = tmp_file("no-skip");
    write_inventory_xlsx(&path);

    let sheet = open_sheet(&path, "Inventory", 0, 0).unwrap();
    assert_eq!(sheet.headers(), &["Inventory report", "", "", ""]);
    assert_eq!(sheet.rows().count(), 5);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn row_cells_report_sheet_row_numbers() {
    let path = tmp_file("row-numbers");
    write_inventory_xlsx(&path);

    let sheet = open_sheet(&path, "Inventory", 2, 1).unwrap();
    let numbers: Vec<u32> = sheet.rows().map(|cells| cells.row_number()).collect();
    assert_eq!(numbers, vec![4, 5, 6]);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn skipping_past_the_last_row_has_no_header() {
    let path = tmp_file("past-end");
    write_inventory_xlsx(&path);

    let err = open_sheet(&path, "Inventory", 6, 0).unwrap_err();
    assert!(matches!(err, LoadError::MissingHeaderRow { skip_rows: 6 }));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn header_row_as_last_row_yields_no_data() {
    let path = tmp_file("header-last");
    write_inventory_xlsx(&path);

    let sheet = open_sheet(&path, "Inventory", 5, 1).unwrap();
    assert_eq!(sheet.headers(), &["Nut", "250", "bulk"]);
    assert_eq!(sheet.rows().count(), 0);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn missing_sheet_lists_available_sheets() {
    let path = tmp_file("missing-sheet");
    write_inventory_xlsx(&path);

    let err = open_sheet(&path, "Sheet1", 0, 0).unwrap_err();
    match err {
        LoadError::SheetNotFound { sheet, available } => {
            assert_eq!(sheet, "Sheet1");
            assert_eq!(available, vec!["Inventory".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }

    let _ = std::fs::remove_file(&path);
}

#[test]
fn missing_workbook_is_an_io_error() {
    let err = open_sheet(tmp_file("does-not-exist"), "Sheet1", 0, 0).unwrap_err();
    assert!(matches!(err, LoadError::Io(_)));
}

#[test]
fn dates_and_durations_are_rendered_as_text() {
    let path = tmp_file("dates");
    write_dates_xlsx(&path);

    let (headers, rows) = read_decoded(&path, "Sheet1", 0, 0);
    assert_eq!(headers, vec!["What", "When", "Took"]);
    assert_eq!(rows[0][1], ("When".to_string(), Some("2024-01-15 00:00:00".to_string())));
    assert_eq!(rows[0][2], ("Took".to_string(), Some("36:30:00".to_string())));
    assert_eq!(rows[1][1], ("When".to_string(), Some("2024-01-15 09:30:00".to_string())));
    assert_eq!(rows[1][2], ("Took".to_string(), None));

    assert_eq!(read_streamed(&path, "Sheet1", 0, 0), (headers, rows));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn streaming_reader_matches_decoded_reader() {
    let path = tmp_file("streamed");
    write_inventory_xlsx(&path);

    for (skip_rows, skip_cols) in [(2, 1), (0, 0), (1, 2), (5, 1)] {
        assert_eq!(
            read_streamed(&path, "Inventory", skip_rows, skip_cols),
            read_decoded(&path, "Inventory", skip_rows, skip_cols),
            "skip_rows={skip_rows} skip_cols={skip_cols}"
        );
    }

    let _ = std::fs::remove_file(&path);
}

#[test]
fn streamed_rows_report_sheet_row_numbers() {
    let path = tmp_file("streamed-numbers");
    write_inventory_xlsx(&path);

    let mut workbook = open_xlsx(&path).unwrap();
    let mut sheet = StreamingSheet::open(&mut workbook, "Inventory", 2, 1).unwrap();
    let numbers: Vec<u32> = sheet.rows().map(|row| row.unwrap().row_number()).collect();
    assert_eq!(numbers, vec![4, 5, 6]);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn streaming_reader_reports_missing_sheet_and_header() {
    let path = tmp_file("streamed-errors");
    write_inventory_xlsx(&path);

    let mut workbook = open_xlsx(&path).unwrap();
    let err = StreamingSheet::open(&mut workbook, "Sheet1", 0, 0).unwrap_err();
    assert!(matches!(err, LoadError::SheetNotFound { ref available, .. } if available == &["Inventory"]));

    let mut workbook = open_xlsx(&path).unwrap();
    let err = StreamingSheet::open(&mut workbook, "Inventory", 6, 0).unwrap_err();
    assert!(matches!(err, LoadError::MissingHeaderRow { skip_rows: 6 }));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn blank_trailing_header_cell_keeps_its_column() {
    let path = tmp_file("blank-header");
    write_blank_trailing_header_xlsx(&path);

    let expected = (
        vec!["Name".to_string(), String::new()],
        vec![vec![
            ("Name".to_string(), Some("Ada".to_string())),
            (String::new(), Some("x".to_string())),
        ]],
    );
    assert_eq!(read_decoded(&path, "Sheet1", 0, 0), expected);
    assert_eq!(read_streamed(&path, "Sheet1", 0, 0), expected);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn missing_workbook_is_an_io_error_for_streaming() {
    let err = open_xlsx(tmp_file("does-not-exist-streamed")).err().unwrap();
    assert!(matches!(err, LoadError::Io(_)));
}
