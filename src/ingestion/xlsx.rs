//! Streaming reader for `.xlsx`/`.xlsm` sheets.
//!
//! [`open_sheet`](super::open_sheet) decodes a whole sheet into a calamine `Range` before the
//! first row is read. For Office Open XML workbooks, [`StreamingSheet`] instead pulls cells one
//! at a time from the worksheet XML, so only the header row and the row being loaded are held in
//! memory. Row and column positions are absolute, as in [`super::sheet`].

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use tracing::debug;

use crate::error::{LoadError, LoadResult};
use crate::ingestion::sheet::{cell_text, cell_to_string};
use crate::types::CellValue;

/// A cell position `(row, col)` with its decoded value.
pub type PositionedCell = ((u32, u32), Data);

/// Source of cells in row-major order; `Ok(None)` once the sheet is exhausted.
pub type CellStream<'a> = Box<dyn FnMut() -> LoadResult<Option<PositionedCell>> + 'a>;

/// Whether `path` names a workbook format that [`StreamingSheet`] can read.
pub fn supports_streaming(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xlsm"))
}

/// Open an Office Open XML workbook.
///
/// Fails with [`LoadError::Io`] if the file cannot be accessed and [`LoadError::Excel`] if it is
/// not a readable workbook.
pub fn open_xlsx(path: impl AsRef<Path>) -> LoadResult<Xlsx<BufReader<File>>> {
    let path = path.as_ref();
    std::fs::metadata(path)?;
    open_workbook(path).map_err(|e| LoadError::Excel(calamine::Error::Xlsx(e)))
}

/// A sheet positioned after its header row, reading data rows straight from the workbook.
pub struct StreamingSheet<'a> {
    name: String,
    headers: Vec<String>,
    cursor: Cursor<'a>,
}

impl fmt::Debug for StreamingSheet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingSheet")
            .field("name", &self.name)
            .field("headers", &self.headers)
            .field("next_row", &self.cursor.next_row)
            .finish()
    }
}

impl<'a> StreamingSheet<'a> {
    /// Open `sheet_name` of `workbook`; same skip rules and failures as
    /// [`open_sheet`](super::open_sheet).
    ///
    /// The header row spans the larger of its own last cell and the sheet's declared dimension.
    pub fn open(
        workbook: &'a mut Xlsx<BufReader<File>>,
        sheet_name: &str,
        skip_rows: u32,
        skip_cols: u32,
    ) -> LoadResult<Self> {
        let available = workbook.sheet_names();
        if !available.iter().any(|s| s == sheet_name) {
            return Err(LoadError::SheetNotFound {
                sheet: sheet_name.to_string(),
                available,
            });
        }

        let mut reader = workbook
            .worksheet_cells_reader(sheet_name)
            .map_err(calamine::Error::Xlsx)?;
        let end_col = reader.dimensions().end.1;
        let cells: CellStream<'a> = Box::new(move || -> LoadResult<Option<PositionedCell>> {
            let cell = reader.next_cell().map_err(calamine::Error::Xlsx)?;
            Ok(cell.map(|c| (c.get_position(), Data::from(c.get_value().clone()))))
        });

        Self::from_cells(sheet_name, cells, Some(end_col), skip_rows, skip_cols)
    }

    /// Build a sheet over any row-major cell source.
    ///
    /// `end_col` is the last used column declared by the source, if it declares one.
    pub fn from_cells(
        name: &str,
        cells: CellStream<'a>,
        end_col: Option<u32>,
        skip_rows: u32,
        skip_cols: u32,
    ) -> LoadResult<Self> {
        let mut cursor = Cursor {
            cells,
            pending: None,
            next_row: skip_rows.saturating_add(1),
            first_col: skip_cols,
            width: 0,
            failed: false,
        };

        let mut labels: Vec<(u32, String)> = Vec::new();
        let mut reached_header = false;
        while let Some(((row, col), value)) = cursor.pull()? {
            if row < skip_rows {
                continue;
            }
            reached_header = true;
            if row > skip_rows {
                cursor.pending = Some(((row, col), value));
                break;
            }
            if col >= skip_cols {
                labels.push((col, cell_to_string(&value)));
            }
        }
        if !reached_header {
            return Err(LoadError::MissingHeaderRow { skip_rows });
        }

        let last_col = labels.iter().map(|(col, _)| *col).max().max(end_col);
        let width = last_col.map_or(0, |col| (col + 1).saturating_sub(skip_cols) as usize);
        let mut headers = vec![String::new(); width];
        for (col, label) in labels {
            headers[(col - skip_cols) as usize] = label;
        }
        cursor.width = width;

        debug!(sheet = name, ?headers, "opened sheet for streaming");

        Ok(Self {
            name: name.to_string(),
            headers,
            cursor,
        })
    }

    /// Sheet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Header labels in column order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Single-pass iterator over the data rows below the header row.
    pub fn rows(&mut self) -> StreamingRows<'_, 'a> {
        StreamingRows {
            headers: &self.headers,
            cursor: &mut self.cursor,
        }
    }
}

struct Cursor<'a> {
    cells: CellStream<'a>,
    pending: Option<PositionedCell>,
    next_row: u32,
    first_col: u32,
    width: usize,
    failed: bool,
}

impl Cursor<'_> {
    /// Next non-empty cell, from `pending` first.
    fn pull(&mut self) -> LoadResult<Option<PositionedCell>> {
        if let Some(cell) = self.pending.take() {
            return Ok(Some(cell));
        }
        loop {
            match (self.cells)()? {
                Some((_, Data::Empty)) => continue,
                other => return Ok(other),
            }
        }
    }

    fn peek_row(&mut self) -> LoadResult<Option<u32>> {
        if self.pending.is_none() {
            self.pending = self.pull()?;
        }
        Ok(self.pending.as_ref().map(|((row, _), _)| *row))
    }

    /// Values of the next data row; rows with no stored cells come back all `None`.
    fn next_row(&mut self) -> LoadResult<Option<(u32, Vec<CellValue>)>> {
        let row = self.next_row;
        if self.peek_row()?.is_none() {
            return Ok(None);
        }
        let mut values = vec![None; self.width];
        while self.peek_row()?.is_some_and(|r| r <= row) {
            let Some(((_, col), value)) = self.pending.take() else {
                break;
            };
            if col < self.first_col {
                continue;
            }
            let idx = (col - self.first_col) as usize;
            let text = cell_text(&value);
            match values.get_mut(idx) {
                Some(slot) => *slot = text,
                None if text.as_deref().is_some_and(|t| !t.is_empty()) => {
                    return Err(LoadError::RowWiderThanHeader {
                        row: row + 1,
                        width: self.width,
                    });
                }
                None => {}
            }
        }
        self.next_row += 1;
        Ok(Some((row, values)))
    }
}

/// Iterator over streamed data rows; see [`StreamingSheet::rows`].
///
/// Yields `Err` at most once, then stops.
pub struct StreamingRows<'s, 'a> {
    headers: &'s [String],
    cursor: &'s mut Cursor<'a>,
}

impl<'s> Iterator for StreamingRows<'s, '_> {
    type Item = LoadResult<StreamedRow<'s>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.failed {
            return None;
        }
        let headers = self.headers;
        let next = self.cursor.next_row().map(|row| {
            row.map(|(row, values)| StreamedRow {
                headers: headers.iter(),
                values: values.into_iter(),
                row,
            })
        });
        if next.is_err() {
            self.cursor.failed = true;
        }
        next.transpose()
    }
}

/// Iterator over `(header, value)` pairs of one streamed row, in column order.
#[derive(Debug)]
pub struct StreamedRow<'s> {
    headers: std::slice::Iter<'s, String>,
    values: std::vec::IntoIter<CellValue>,
    row: u32,
}

impl StreamedRow<'_> {
    /// 1-based sheet row number (Excel-like).
    pub fn row_number(&self) -> u32 {
        self.row + 1
    }
}

impl<'s> Iterator for StreamedRow<'s> {
    type Item = (&'s str, CellValue);

    fn next(&mut self) -> Option<Self::Item> {
        let header = self.headers.next()?;
        let value = self.values.next()?;
        Some((header.as_str(), value))
    }
}
