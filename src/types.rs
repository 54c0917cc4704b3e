//! Core data model types for a sheet load.
//!
//! A load turns spreadsheet rows into [`RowRecord`]s shaped by a [`RowEntity`]: one synthetic
//! integer id plus one text [`Column`] per header.

use std::fmt;

/// A single cell value as stored: text, or `None` for an empty cell.
pub type CellValue = Option<String>;

/// Returns `true` for cells that count as empty when deciding whether to skip a row.
pub fn is_blank(value: &CellValue) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

/// One text column of a [`RowEntity`], derived from a header label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Header label as read from the sheet.
    pub header: String,
    /// Storage-safe attribute name, unique within the entity.
    pub key: String,
    /// Physical column name in the table (`data_<header>`).
    pub label: String,
}

/// Row-storage entity: a table with an integer identity column and one text column per header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowEntity {
    /// Display name used when rendering records.
    pub name: String,
    /// Table name in the target store.
    pub table: String,
    /// Ordered text columns (the identity column is implicit).
    pub columns: Vec<Column>,
}

impl RowEntity {
    /// Iterate column keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.key.as_str())
    }

    /// Returns the index of a column by its key, if present.
    pub fn index_of_key(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.key == key)
    }

    /// Returns the index of the `occurrence`-th (0-based) column carrying `header`.
    ///
    /// Repeated headers map to distinct columns in sheet order.
    pub fn resolve_header(&self, header: &str, occurrence: usize) -> Option<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.header == header)
            .nth(occurrence)
            .map(|(idx, _)| idx)
    }

    /// Returns a [`fmt::Display`] adapter rendering `record` as
    /// `<Name(id=1, data_h1='v1', ...)>`.
    pub fn display<'a>(&'a self, record: &'a RowRecord) -> RecordDisplay<'a> {
        RecordDisplay {
            entity: self,
            record,
        }
    }

    /// Render `record` to a string (see [`Self::display`]).
    pub fn render(&self, record: &RowRecord) -> String {
        self.display(record).to_string()
    }
}

/// One spreadsheet row, shaped by a [`RowEntity`].
///
/// `values` is in the same order as [`RowEntity::columns`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRecord {
    /// Identity assigned by the store; `None` until committed.
    pub id: Option<i64>,
    /// Per-column text values.
    pub values: Vec<CellValue>,
}

impl RowRecord {
    /// A new, not yet persisted record.
    pub fn new(values: Vec<CellValue>) -> Self {
        Self { id: None, values }
    }

    /// Look up a value by column key.
    pub fn get<'a>(&'a self, entity: &RowEntity, key: &str) -> Option<&'a CellValue> {
        entity.index_of_key(key).and_then(|idx| self.values.get(idx))
    }
}

/// Display adapter returned by [`RowEntity::display`].
pub struct RecordDisplay<'a> {
    entity: &'a RowEntity,
    record: &'a RowRecord,
}

impl fmt::Display for RecordDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}(id={}",
            self.entity.name,
            self.record.id.unwrap_or(-1)
        )?;
        for (column, value) in self.entity.columns.iter().zip(self.record.values.iter()) {
            match value {
                Some(v) => write!(f, ", {}='{}'", column.label, v)?,
                None => write!(f, ", {}=None", column.label)?,
            }
        }
        write!(f, ")>")
    }
}
