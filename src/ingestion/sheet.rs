//! Forward-only reader over one sheet of a workbook.
//!
//! [`open_sheet`] decodes the sheet, reads the header row and hands back a [`Sheet`]. Data rows are
//! then walked lazily through [`Sheet::rows`], and each row's cells lazily through [`RowCells`].
//! Positions are absolute sheet coordinates starting at `A1`, so blank leading rows and columns
//! count toward the skip counts.

use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Range, Reader};
use chrono::Duration;
use tracing::debug;

use crate::error::{LoadError, LoadResult};
use crate::types::CellValue;

/// A sheet positioned after its header row.
#[derive(Debug)]
pub struct Sheet {
    name: String,
    headers: Vec<String>,
    range: Range<Data>,
    first_data_row: u32,
    first_col: u32,
}

/// Open `sheet_name` from the workbook at `path`.
///
/// Behavior:
/// - Discards the first `skip_rows` rows; the next row is the header row
/// - Discards the first `skip_cols` cells of the header row and of every data row
/// - Empty header cells become empty labels
///
/// The whole sheet is decoded into memory before this returns. [`crate::pipeline`] uses it for
/// `.xls`, `.xlsb` and `.ods` workbooks and streams `.xlsx`/`.xlsm` through
/// [`StreamingSheet`](super::xlsx::StreamingSheet).
///
/// Fails with [`LoadError::Io`] if the file cannot be accessed, [`LoadError::SheetNotFound`] if
/// the workbook has no such sheet and [`LoadError::MissingHeaderRow`] if the sheet ends before
/// the header row.
pub fn open_sheet(
    path: impl AsRef<Path>,
    sheet_name: &str,
    skip_rows: u32,
    skip_cols: u32,
) -> LoadResult<Sheet> {
    let path = path.as_ref();
    std::fs::metadata(path)?;
    let mut workbook = open_workbook_auto(path)?;

    let available: Vec<String> = workbook.sheet_names().to_vec();
    if !available.iter().any(|s| s == sheet_name) {
        return Err(LoadError::SheetNotFound {
            sheet: sheet_name.to_string(),
            available,
        });
    }

    let range = workbook.worksheet_range(sheet_name)?;
    let end_col = match range.end() {
        Some((end_row, end_col)) if end_row >= skip_rows => end_col,
        _ => return Err(LoadError::MissingHeaderRow { skip_rows }),
    };

    let headers: Vec<String> = (skip_cols..=end_col)
        .map(|col| {
            range
                .get_value((skip_rows, col))
                .map(cell_to_string)
                .unwrap_or_default()
        })
        .collect();

    debug!(
        path = %path.display(),
        sheet = sheet_name,
        ?headers,
        "opened sheet"
    );

    Ok(Sheet {
        name: sheet_name.to_string(),
        headers,
        range,
        first_data_row: skip_rows.saturating_add(1),
        first_col: skip_cols,
    })
}

impl Sheet {
    /// Sheet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Header labels in column order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Lazy iterator over the data rows below the header row.
    pub fn rows(&self) -> Rows<'_> {
        Rows {
            sheet: self,
            next_row: self.first_data_row,
            end_row: self.range.end().map(|(row, _)| row),
        }
    }
}

/// Iterator over data rows; see [`Sheet::rows`].
#[derive(Debug)]
pub struct Rows<'a> {
    sheet: &'a Sheet,
    next_row: u32,
    end_row: Option<u32>,
}

impl<'a> Iterator for Rows<'a> {
    type Item = RowCells<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let end_row = self.end_row?;
        if self.next_row > end_row {
            return None;
        }
        let row = self.next_row;
        self.next_row += 1;
        Some(RowCells {
            sheet: self.sheet,
            row,
            idx: 0,
        })
    }
}

/// Iterator over `(header, value)` pairs of one row, in column order.
#[derive(Debug)]
pub struct RowCells<'a> {
    sheet: &'a Sheet,
    row: u32,
    idx: usize,
}

impl RowCells<'_> {
    /// 1-based sheet row number (Excel-like).
    pub fn row_number(&self) -> u32 {
        self.row + 1
    }
}

impl<'a> Iterator for RowCells<'a> {
    type Item = (&'a str, CellValue);

    fn next(&mut self) -> Option<Self::Item> {
        let header = self.sheet.headers.get(self.idx)?;
        let col = self.sheet.first_col + self.idx as u32;
        self.idx += 1;
        let value = self.sheet.range.get_value((self.row, col)).and_then(cell_text);
        Some((header.as_str(), value))
    }
}

/// Text value of a cell, `None` for empty cells.
pub fn cell_text(c: &Data) -> CellValue {
    match c {
        Data::Empty => None,
        other => Some(cell_to_string(other)),
    }
}

pub(crate) fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) if dt.is_duration() => dt
            .as_duration()
            .map(format_duration)
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|v| v.to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(s) => c.as_datetime().map_or_else(|| s.clone(), |v| v.to_string()),
        Data::DurationIso(s) => c.as_duration().map_or_else(|| s.clone(), format_duration),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => String::new(),
    }
}

/// `[h]:mm:ss`, with milliseconds only when present. Hours are not wrapped at 24.
fn format_duration(d: Duration) -> String {
    let ms = d.num_milliseconds();
    let sign = if ms < 0 { "-" } else { "" };
    let ms = ms.unsigned_abs();
    let (secs, millis) = (ms / 1000, ms % 1000);
    let (h, m, s) = (secs / 3600, secs % 3600 / 60, secs % 60);
    if millis == 0 {
        format!("{sign}{h}:{m:02}:{s:02}")
    } else {
        format!("{sign}{h}:{m:02}:{s:02}.{millis:03}")
    }
}
