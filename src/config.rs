//! Load configuration.
//!
//! A [`LoadConfig`] names the workbook, the sheet, the skip counts and the target store. It can
//! be read from TOML; any field left out takes its default:
//!
//! ```toml
//! workbook = "book.xlsx"
//! sheet = "Sheet1"
//! skip_rows = 0
//! skip_cols = 0
//! database_url = "sqlite:///:memory:"
//! table = "exceldata"
//! entity = "ExcelRow"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{LoadError, LoadResult};
use crate::schema::{DEFAULT_ENTITY_NAME, DEFAULT_TABLE_NAME};
use crate::store::DEFAULT_DATABASE_URL;

/// Everything a single load needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    /// Path of the workbook to read.
    pub workbook: PathBuf,
    /// Name of the sheet to read.
    pub sheet: String,
    /// Leading rows to discard before the header row.
    pub skip_rows: u32,
    /// Leading columns to discard from the header row and every data row.
    pub skip_cols: u32,
    /// Target store URL (see [`crate::store::parse_database_url`]).
    pub database_url: String,
    /// Target table name.
    pub table: String,
    /// Display name of rendered records.
    pub entity: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            workbook: PathBuf::from("book.xlsx"),
            sheet: "Sheet1".to_string(),
            skip_rows: 0,
            skip_cols: 0,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            table: DEFAULT_TABLE_NAME.to_string(),
            entity: DEFAULT_ENTITY_NAME.to_string(),
        }
    }
}

impl LoadConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::Config {
            message: format!("failed to read config file {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML config text.
    pub fn from_toml_str(content: &str) -> LoadResult<Self> {
        let config: LoadConfig = toml::from_str(content).map_err(|e| LoadError::Config {
            message: format!("failed to parse config: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of this config.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(workbook) = overrides.workbook {
            self.workbook = workbook;
        }
        if let Some(sheet) = overrides.sheet {
            self.sheet = sheet;
        }
        if let Some(skip_rows) = overrides.skip_rows {
            self.skip_rows = skip_rows;
        }
        if let Some(skip_cols) = overrides.skip_cols {
            self.skip_cols = skip_cols;
        }
        if let Some(database_url) = overrides.database_url {
            self.database_url = database_url;
        }
        if let Some(table) = overrides.table {
            self.table = table;
        }
        self
    }

    /// Check the fields that have no sensible empty value.
    pub fn validate(&self) -> LoadResult<()> {
        if self.workbook.as_os_str().is_empty() {
            return Err(LoadError::Config {
                message: "workbook cannot be empty".to_string(),
            });
        }
        if self.sheet.is_empty() {
            return Err(LoadError::Config {
                message: "sheet cannot be empty".to_string(),
            });
        }
        if self.table.is_empty() {
            return Err(LoadError::Config {
                message: "table cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Optional per-field replacements, typically from CLI flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub workbook: Option<PathBuf>,
    pub sheet: Option<String>,
    pub skip_rows: Option<u32>,
    pub skip_cols: Option<u32>,
    pub database_url: Option<String>,
    pub table: Option<String>,
}
