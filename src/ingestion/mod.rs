//! Reading the source sheet and reporting load outcomes.
//!
//! - [`sheet`]: forward-only access to one decoded sheet of any format ([`open_sheet`])
//! - [`xlsx`]: cell-by-cell streaming for `.xlsx`/`.xlsm` sheets ([`StreamingSheet`])
//! - [`observability`]: observer hooks invoked by [`crate::pipeline::run`]

pub mod observability;
pub mod sheet;
pub mod xlsx;

pub use observability::{
    observer_for, CompositeObserver, FileObserver, LoadContext, LoadObserver, LoadSeverity,
    TracingObserver,
};
pub use sheet::{open_sheet, RowCells, Rows, Sheet};
pub use xlsx::{open_xlsx, supports_streaming, StreamedRow, StreamingRows, StreamingSheet};
