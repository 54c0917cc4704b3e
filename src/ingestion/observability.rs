use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{error, info, warn};

use crate::config::LoadConfig;
use crate::error::LoadError;
use crate::loader::LoadStats;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoadSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (the load failed).
    Error,
    /// Critical error (I/O or the target store itself failed).
    Critical,
}

impl LoadSeverity {
    /// Classify a load error.
    pub fn for_error(e: &LoadError) -> Self {
        match e {
            LoadError::Io(_) | LoadError::Sqlite(_) => Self::Critical,
            LoadError::Excel(_)
            | LoadError::Config { .. }
            | LoadError::SheetNotFound { .. }
            | LoadError::MissingHeaderRow { .. }
            | LoadError::RowWiderThanHeader { .. }
            | LoadError::UnexpectedColumn { .. }
            | LoadError::UnsupportedDatabaseUrl { .. } => Self::Error,
        }
    }
}

/// Context about a load attempt.
#[derive(Debug, Clone)]
pub struct LoadContext {
    /// Workbook being read.
    pub workbook: PathBuf,
    /// Sheet being read.
    pub sheet: String,
    /// Target table.
    pub table: String,
}

impl LoadContext {
    /// Build the context for a configured load.
    pub fn from_config(config: &LoadConfig) -> Self {
        Self {
            workbook: config.workbook.clone(),
            sheet: config.sheet.clone(),
            table: config.table.clone(),
        }
    }
}

impl fmt::Display for LoadContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "workbook={} sheet={} table={}",
            self.workbook.display(),
            self.sheet,
            self.table
        )
    }
}

/// Observer interface for load outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait LoadObserver: Send + Sync {
    /// Called when the load commits.
    fn on_success(&self, _ctx: &LoadContext, _stats: LoadStats) {}

    /// Called when the load fails.
    fn on_failure(&self, _ctx: &LoadContext, _severity: LoadSeverity, _error: &LoadError) {}

    /// Called when a load failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &LoadContext, severity: LoadSeverity, error: &LoadError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Fans every callback out to a list of observers, in order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn LoadObserver>>,
}

impl CompositeObserver {
    /// Create a composite over `observers`.
    pub fn new(observers: Vec<Arc<dyn LoadObserver>>) -> Self {
        Self { observers }
    }

    fn each(&self, f: impl Fn(&dyn LoadObserver)) {
        self.observers.iter().for_each(|o| f(o.as_ref()));
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl LoadObserver for CompositeObserver {
    fn on_success(&self, ctx: &LoadContext, stats: LoadStats) {
        self.each(|o| o.on_success(ctx, stats));
    }

    fn on_failure(&self, ctx: &LoadContext, severity: LoadSeverity, error: &LoadError) {
        self.each(|o| o.on_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &LoadContext, severity: LoadSeverity, error: &LoadError) {
        self.each(|o| o.on_alert(ctx, severity, error));
    }
}

/// Emits load outcomes as `tracing` events, one per load.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl LoadObserver for TracingObserver {
    fn on_success(&self, ctx: &LoadContext, stats: LoadStats) {
        info!(
            workbook = %ctx.workbook.display(),
            sheet = %ctx.sheet,
            table = %ctx.table,
            rows_read = stats.rows_read,
            rows_skipped = stats.rows_skipped,
            rows_staged = stats.rows_staged,
            "load committed"
        );
    }

    fn on_failure(&self, ctx: &LoadContext, severity: LoadSeverity, error: &LoadError) {
        error!(
            ?severity,
            workbook = %ctx.workbook.display(),
            sheet = %ctx.sheet,
            table = %ctx.table,
            error = %error,
            "load failed"
        );
    }

    // The failure event already carries the severity.
    fn on_alert(&self, _ctx: &LoadContext, _severity: LoadSeverity, _error: &LoadError) {}
}

/// Appends one line per load event to a log file.
///
/// The file is opened on the first event and kept open. Open or write failures are reported
/// through `tracing` and never fail the load.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FileObserver {
    /// Create an observer appending to `path`; nothing is opened yet.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: Mutex::new(None),
        }
    }

    /// Path of the event log.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, event: fmt::Arguments<'_>) {
        let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if file.is_none() {
            match OpenOptions::new().create(true).append(true).open(&self.path) {
                Ok(f) => *file = Some(f),
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "cannot open event log");
                    return;
                }
            }
        }
        if let Some(f) = file.as_mut() {
            if let Err(e) = writeln!(f, "{} {event}", unix_ts()) {
                warn!(path = %self.path.display(), error = %e, "cannot write event log");
            }
        }
    }
}

impl LoadObserver for FileObserver {
    fn on_success(&self, ctx: &LoadContext, stats: LoadStats) {
        self.append(format_args!(
            "ok {ctx} read={} skipped={} staged={}",
            stats.rows_read, stats.rows_skipped, stats.rows_staged
        ));
    }

    fn on_failure(&self, ctx: &LoadContext, severity: LoadSeverity, error: &LoadError) {
        self.append(format_args!("fail severity={severity:?} {ctx} err={error}"));
    }

    fn on_alert(&self, ctx: &LoadContext, severity: LoadSeverity, error: &LoadError) {
        self.append(format_args!("ALERT severity={severity:?} {ctx} err={error}"));
    }
}

/// Observer for a command-line load: `tracing` events, plus an event log when `event_log` is set.
pub fn observer_for(event_log: Option<&Path>) -> Arc<dyn LoadObserver> {
    match event_log {
        Some(path) => {
            let observers: Vec<Arc<dyn LoadObserver>> =
                vec![Arc::new(TracingObserver), Arc::new(FileObserver::new(path))];
            Arc::new(CompositeObserver::new(observers))
        }
        None => Arc::new(TracingObserver),
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
