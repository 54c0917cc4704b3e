use thiserror::Error;

/// Convenience result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Error type returned by every stage of a sheet load.
///
/// Nothing is recovered locally: each stage propagates its failure up to [`crate::pipeline::run`],
/// which reports it to the configured observer and hands it back to the caller.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Underlying I/O error (e.g. workbook not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The workbook could not be decoded.
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// The target store rejected a statement, a connection, or a commit.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Configuration could not be read, parsed, or failed validation.
    #[error("config error: {message}")]
    Config { message: String },

    /// The workbook has no sheet with the requested name.
    #[error("sheet '{sheet}' not found (available: {available:?})")]
    SheetNotFound { sheet: String, available: Vec<String> },

    /// There is no row left to use as a header after skipping `skip_rows` rows.
    #[error("no header row found after skipping {skip_rows} row(s)")]
    MissingHeaderRow { skip_rows: u32 },

    /// A data row holds a value to the right of the header row's last column.
    #[error("row {row} has a value beyond the {width} header column(s)")]
    RowWiderThanHeader { row: u32, width: usize },

    /// A row carried a header that the synthesized schema has no column for.
    #[error("unexpected column '{header}' (not part of the table schema)")]
    UnexpectedColumn { header: String },

    /// The database URL does not name a SQLite target.
    #[error("unsupported database url '{url}' (expected sqlite://, :memory: or a file path)")]
    UnsupportedDatabaseUrl { url: String },
}
