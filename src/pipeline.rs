//! Load entrypoint.
//!
//! Most callers should use [`run`], which performs the whole load for a [`LoadConfig`]:
//!
//! 1. connect to the target store
//! 2. open the sheet and read its header row (`.xlsx`/`.xlsm` are streamed cell by cell, other
//!    formats are decoded whole)
//! 3. synthesize the [`RowEntity`] and create its table if absent
//! 4. stage every non-empty row in one [`crate::store::Session`]
//! 5. commit, then read back every stored row
//!
//! If a [`LoadObserver`] is provided, success/failure/alerts are reported to it.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::LoadConfig;
use crate::error::LoadResult;
use crate::ingestion::observability::{LoadContext, LoadObserver, LoadSeverity};
use crate::ingestion::sheet::open_sheet;
use crate::ingestion::xlsx::{open_xlsx, supports_streaming, StreamingSheet};
use crate::loader::{try_stage_rows, LoadStats};
use crate::store::Store;
use crate::types::{CellValue, RowEntity, RowRecord};

/// Options controlling observer reporting.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct LoadOptions {
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn LoadObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: LoadSeverity,
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            observer: None,
            alert_at_or_above: LoadSeverity::Critical,
        }
    }
}

/// Outcome of a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Entity synthesized from the header row.
    pub entity: RowEntity,
    /// Every row in the target table after the commit, ordered by id.
    pub records: Vec<RowRecord>,
    /// Staging counts for this load.
    pub stats: LoadStats,
}

impl LoadReport {
    /// One rendered line per stored row.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.records.iter().map(|r| self.entity.render(r))
    }
}

/// Run a complete load against the store named by `config.database_url`.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with staging stats
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// ```no_run
/// use std::sync::Arc;
///
/// use sheet2db::config::LoadConfig;
/// use sheet2db::ingestion::TracingObserver;
/// use sheet2db::pipeline::{run, LoadOptions};
///
/// # fn main() -> Result<(), sheet2db::LoadError> {
/// let config = LoadConfig {
///     workbook: "people.xlsx".into(),
///     ..Default::default()
/// };
/// let opts = LoadOptions {
///     observer: Some(Arc::new(TracingObserver)),
///     ..Default::default()
/// };
///
/// let report = run(&config, &opts)?;
/// for line in report.lines() {
///     println!("{line}");
/// }
/// # Ok(())
/// # }
/// ```
pub fn run(config: &LoadConfig, options: &LoadOptions) -> LoadResult<LoadReport> {
    let result = config
        .validate()
        .and_then(|()| Store::connect(&config.database_url))
        .and_then(|mut store| load_into(&mut store, config));
    notify(config, options, &result);
    result
}

/// Like [`run`], but against an already connected store.
///
/// The store stays usable afterwards, so repeated loads into one database are possible.
pub fn run_with_store(
    store: &mut Store,
    config: &LoadConfig,
    options: &LoadOptions,
) -> LoadResult<LoadReport> {
    let result = config.validate().and_then(|()| load_into(store, config));
    notify(config, options, &result);
    result
}

fn load_into(store: &mut Store, config: &LoadConfig) -> LoadResult<LoadReport> {
    let (entity, stats) = if supports_streaming(&config.workbook) {
        let mut workbook = open_xlsx(&config.workbook)?;
        let mut sheet = StreamingSheet::open(
            &mut workbook,
            &config.sheet,
            config.skip_rows,
            config.skip_cols,
        )?;
        let entity = RowEntity::from_headers(&config.entity, &config.table, sheet.headers());
        let stats = stage_and_commit(store, &entity, sheet.rows())?;
        debug!(sheet = sheet.name(), ?stats, streamed = true, "sheet loaded");
        (entity, stats)
    } else {
        let sheet = open_sheet(
            &config.workbook,
            &config.sheet,
            config.skip_rows,
            config.skip_cols,
        )?;
        let entity = RowEntity::from_headers(&config.entity, &config.table, sheet.headers());
        let stats = stage_and_commit(store, &entity, sheet.rows().map(Ok))?;
        debug!(sheet = sheet.name(), ?stats, streamed = false, "sheet loaded");
        (entity, stats)
    };

    let records = store.query_all(&entity)?;
    Ok(LoadReport {
        entity,
        records,
        stats,
    })
}

fn stage_and_commit<R, C, H>(
    store: &mut Store,
    entity: &RowEntity,
    rows: R,
) -> LoadResult<LoadStats>
where
    R: IntoIterator<Item = LoadResult<C>>,
    C: IntoIterator<Item = (H, CellValue)>,
    H: AsRef<str>,
{
    store.create_table(entity)?;
    let mut session = store.session(entity);
    let stats = try_stage_rows(rows, &mut session)?;
    session.commit()?;
    Ok(stats)
}

fn notify(config: &LoadConfig, options: &LoadOptions, result: &LoadResult<LoadReport>) {
    let Some(obs) = options.observer.as_ref() else {
        return;
    };
    let ctx = LoadContext::from_config(config);
    match result {
        Ok(report) => obs.on_success(&ctx, report.stats),
        Err(e) => {
            let sev = LoadSeverity::for_error(e);
            obs.on_failure(&ctx, sev, e);
            if sev >= options.alert_at_or_above {
                obs.on_alert(&ctx, sev, e);
            }
        }
    }
}
