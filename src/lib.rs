//! `sheet2db` loads one sheet of a spreadsheet workbook into a relational table.
//!
//! Column names come from the header row and every value is stored as text. The primary
//! entrypoint is [`pipeline::run`], which reads the sheet, creates the table if absent, stages
//! every non-empty row, commits them in one transaction and returns every stored row.
//!
//! ## Inputs
//!
//! **Workbooks (format auto-detected):** `.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`.
//!
//! **Target store:** SQLite, addressed with a SQLAlchemy-style URL. The default
//! `sqlite:///:memory:` is transient and vanishes when the process exits.
//!
//! ## Table shape
//!
//! For headers `Name` and `Age` the table is:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS "exceldata" ("id" INTEGER PRIMARY KEY, "data_Name" TEXT, "data_Age" TEXT)
//! ```
//!
//! and each stored row renders as `<ExcelRow(id=1, data_Name='Alice', data_Age='30')>`.
//! Empty cells are stored as `NULL`; rows whose cells are all empty are skipped.
//!
//! ## Quick example
//!
//! ```no_run
//! use sheet2db::config::LoadConfig;
//! use sheet2db::pipeline::{run, LoadOptions};
//!
//! # fn main() -> Result<(), sheet2db::LoadError> {
//! let config = LoadConfig {
//!     workbook: "book.xlsx".into(),
//!     sheet: "Sheet1".to_string(),
//!     skip_rows: 2,
//!     skip_cols: 1,
//!     ..Default::default()
//! };
//! let report = run(&config, &LoadOptions::default())?;
//! println!("staged={} skipped={}", report.stats.rows_staged, report.stats.rows_skipped);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: sheet readers (decoded, or streamed for `.xlsx`) and observer hooks
//! - [`schema`]: Column Keys and the table descriptor
//! - [`loader`]: staging rows into a unit-of-work
//! - [`store`]: SQLite connection, table creation, commit and read-back
//! - [`pipeline`]: the end-to-end load
//! - [`config`]: load configuration (TOML + overrides)
//! - [`types`]: entity and record types
//! - [`error`]: error type used across the crate

pub mod config;
pub mod error;
pub mod ingestion;
pub mod loader;
pub mod pipeline;
pub mod schema;
pub mod store;
pub mod types;

pub use error::{LoadError, LoadResult};
