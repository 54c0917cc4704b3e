use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sheet2db::config::{ConfigOverrides, LoadConfig};
use sheet2db::ingestion::observer_for;
use sheet2db::pipeline::{run, LoadOptions};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Load one sheet of a workbook into a SQLite table and print every stored row.
#[derive(Parser, Debug)]
#[command(name = "sheet2db")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML config file; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Workbook to read (.xlsx, .xlsm, .xlsb, .xls, .ods)
    #[arg(long)]
    workbook: Option<PathBuf>,

    /// Sheet name
    #[arg(long)]
    sheet: Option<String>,

    /// Rows to skip before the header row
    #[arg(long)]
    skip_rows: Option<u32>,

    /// Columns to skip on the left
    #[arg(long)]
    skip_cols: Option<u32>,

    /// Target store, e.g. sqlite:///out.db (default: in-memory)
    #[arg(long)]
    database_url: Option<String>,

    /// Target table name
    #[arg(long)]
    table: Option<String>,

    /// Append one line per load outcome to this file
    #[arg(long)]
    event_log: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            workbook: self.workbook.clone(),
            sheet: self.sheet.clone(),
            skip_rows: self.skip_rows,
            skip_cols: self.skip_cols,
            database_url: self.database_url.clone(),
            table: self.table.clone(),
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let base = match cli.config.as_ref() {
        Some(path) => match LoadConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                error!(error = %e, "failed to load config");
                return ExitCode::FAILURE;
            }
        },
        None => LoadConfig::default(),
    };
    let config = base.with_overrides(cli.overrides());
    info!(?config, "sheet2db starting");

    let options = LoadOptions {
        observer: Some(observer_for(cli.event_log.as_deref())),
        ..Default::default()
    };

    match run(&config, &options) {
        Ok(report) => {
            for line in report.lines() {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        // The observer has already logged the failure.
        Err(_) => ExitCode::FAILURE,
    }
}
