//! Row loading: stage every non-empty sheet row as a new record in a [`Session`].

use std::collections::HashMap;

use tracing::trace;

use crate::error::{LoadError, LoadResult};
use crate::store::Session;
use crate::types::{is_blank, CellValue, RowRecord};

/// Counts reported after staging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Data rows consumed from the sheet.
    pub rows_read: usize,
    /// Rows dropped because every cell was empty.
    pub rows_skipped: usize,
    /// Rows staged as new records.
    pub rows_staged: usize,
}

/// Consume `rows` once, staging one record per row into `session`.
///
/// Each row is a sequence of `(header, value)` pairs. Rows whose values are all empty are
/// skipped. Headers are matched to the session's entity columns in order of appearance, so a
/// header repeated in the sheet fills its repeated columns left to right.
///
/// Fails with [`LoadError::UnexpectedColumn`] when a non-empty row carries a header the entity
/// has no column for.
pub fn stage_rows<R, C, H>(rows: R, session: &mut Session<'_>) -> LoadResult<LoadStats>
where
    R: IntoIterator<Item = C>,
    C: IntoIterator<Item = (H, CellValue)>,
    H: AsRef<str>,
{
    try_stage_rows(rows.into_iter().map(Ok), session)
}

/// Like [`stage_rows`], for sources that can fail while producing a row.
///
/// Stops at the first `Err` and returns it; records staged before it stay pending in `session`.
pub fn try_stage_rows<R, C, H>(rows: R, session: &mut Session<'_>) -> LoadResult<LoadStats>
where
    R: IntoIterator<Item = LoadResult<C>>,
    C: IntoIterator<Item = (H, CellValue)>,
    H: AsRef<str>,
{
    let entity = session.entity();
    let mut stats = LoadStats::default();

    for row in rows {
        let row = row?;
        stats.rows_read += 1;
        let cells: Vec<(H, CellValue)> = row.into_iter().collect();
        if cells.iter().all(|(_, value)| is_blank(value)) {
            trace!(row = stats.rows_read, "skipping empty row");
            stats.rows_skipped += 1;
            continue;
        }

        let mut values: Vec<CellValue> = vec![None; entity.columns.len()];
        let mut occurrences: HashMap<String, usize> = HashMap::new();
        for (header, value) in cells {
            let header = header.as_ref();
            let seen = occurrences.entry(header.to_string()).or_insert(0);
            let idx = entity
                .resolve_header(header, *seen)
                .ok_or_else(|| LoadError::UnexpectedColumn {
                    header: header.to_string(),
                })?;
            *seen += 1;
            values[idx] = value;
        }

        session.add(RowRecord::new(values));
        stats.rows_staged += 1;
    }

    Ok(stats)
}
