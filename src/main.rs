//! Workforce Reports - attendance, leave, payroll and schedule summaries.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use workforce_reports as app;

use app::AppError;
use app::config::{AppConfig, ConfigLoadResult};
use app::report::{ReportFilters, ReportType};
use app::service::ReportService;
use app::source::{DataSources, JsonDirSource};
use app::time_range::{self, RangeMode};

/// Build an HR report from JSON exports and print it.
#[derive(Parser, Debug)]
#[command(name = "workforce-reports", version)]
struct Cli {
    /// Use config.toml from current directory (dev mode)
    #[arg(long)]
    dev: bool,

    /// Explicit config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// overview, attendance, payroll, leave or schedule
    report: ReportType,

    /// week, month or custom
    #[arg(long, default_value = "week")]
    range: RangeMode,

    /// Date inside the week or month to report on (defaults to today)
    #[arg(long)]
    anchor: Option<NaiveDate>,

    /// Custom range start (YYYY-MM-DD), with --range custom
    #[arg(long, required_if_eq("range", "custom"))]
    start: Option<NaiveDate>,

    /// Custom range end (YYYY-MM-DD), with --range custom
    #[arg(long, required_if_eq("range", "custom"))]
    end: Option<NaiveDate>,

    /// Limit the report to one department
    #[arg(long)]
    department: Option<i32>,

    /// Override the configured data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Print headline lines instead of JSON
    #[arg(long)]
    summary: bool,
}

impl Cli {
    /// `--start`/`--end` only apply to a custom range.
    fn check_range(&self) -> Result<(), clap::Error> {
        if self.range != RangeMode::Custom && (self.start.is_some() || self.end.is_some()) {
            return Err(Cli::command().error(
                ErrorKind::ArgumentConflict,
                format!("--start/--end require --range custom, not --range {}", self.range),
            ));
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Err(e) = cli.check_range() {
        e.exit();
    }

    // Determine config path based on mode
    let config_path = match (&cli.config, cli.dev) {
        (Some(path), _) => path.clone(),
        (None, true) => PathBuf::from("config.toml"),
        (None, false) => AppConfig::default_path(),
    };

    let (mut config, missing) = match AppConfig::try_load(&config_path) {
        ConfigLoadResult::Loaded(config) => (config, false),
        ConfigLoadResult::Missing => (AppConfig::default(), true),
        ConfigLoadResult::Invalid(e) => {
            return Err(AppError::config(format!("{}: {e}", config_path.display())).into());
        }
    };

    app::logging::init(&config.logging);

    tracing::info!("Workforce Reports starting...");
    if cli.dev {
        tracing::info!("Dev mode: loading config from current directory");
    }
    if missing {
        tracing::info!("Config missing at {:?}, using defaults", config_path);
    } else {
        tracing::info!("Config loaded from {:?}", config_path);
    }

    if let Some(dir) = cli.data_dir {
        config.data.dir = dir;
    }

    let anchor = cli.anchor.unwrap_or_else(|| Local::now().date_naive());
    let custom = cli.start.zip(cli.end);
    let window = time_range::resolve(cli.range, anchor, custom)?;
    let filters = ReportFilters::new(&window, cli.department);

    let source = Arc::new(JsonDirSource::new(config.data.dir.clone()));
    let service = ReportService::new(config, DataSources::from_single(source));

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let report = rt.block_on(service.generate(cli.report, &filters))?;

    if cli.summary {
        for line in report.summary_lines() {
            println!("{line}");
        }
    } else {
        println!("{}", report.to_json(cli.pretty)?);
    }

    Ok(())
}
