//! CLI definition and dispatch.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::BacktestConfig;
use crate::domain::bar::normalize;
use crate::domain::batch::{BatchReport, RunPlan, run_batch};
use crate::domain::config_validation::{parse_windows, validate_config};
use crate::domain::enrich::enrich;
use crate::domain::error::IdxtraderError;
use crate::domain::indicator::IndicatorConfig;
use crate::domain::strategy::{StrategyConfig, default_bank, parse_bank};
use crate::domain::summary::SummaryConfig;
use crate::domain::universe::{FilterConfig, IndexMeta, filter_indices, parse_codes};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "idxtrader", about = "Index valuation and threshold strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest the strategy bank over the filtered index universe
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Run a single index, bypassing the universe filter
        #[arg(long)]
        code: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration without running
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Copy the CSV data directory into the SQLite store
    Import {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the latest enriched bar of an index
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            code,
            output,
        } => run_backtest(&config, code.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Import { config } => run_import(&config),
        Command::Info { config, code } => run_info(&config, &code),
    }
}

fn fail(err: IdxtraderError) -> ExitCode {
    error!("{err}");
    ExitCode::from(&err)
}

/// Load and validate the INI file at `path`.
pub fn load_config(path: &Path) -> Result<FileConfigAdapter, IdxtraderError> {
    info!(path = %path.display(), "loading config");
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_config(&adapter)?;
    Ok(adapter)
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, IdxtraderError> {
    let defaults = BacktestConfig::default();
    Ok(BacktestConfig {
        cutoff_date: adapter
            .get_date("backtest", "cutoff_date")?
            .unwrap_or(defaults.cutoff_date),
        warmup_bars: non_negative(
            adapter.get_int("backtest", "warmup_bars", defaults.warmup_bars as i64)?,
        ),
        initial_capital: adapter.get_double(
            "backtest",
            "initial_capital",
            defaults.initial_capital,
        )?,
        stop_loss_pct: adapter.get_double("backtest", "stop_loss", defaults.stop_loss_pct)?,
    })
}

pub fn build_indicator_config(adapter: &dyn ConfigPort) -> Result<IndicatorConfig, IdxtraderError> {
    let defaults = IndicatorConfig::default();
    let ma_windows = match adapter.get_string("indicators", "ma_windows") {
        Some(s) if !s.trim().is_empty() => parse_windows(&s)?,
        _ => defaults.ma_windows,
    };
    Ok(IndicatorConfig {
        ma_windows,
        bollinger_period: non_negative(adapter.get_int(
            "indicators",
            "bollinger_period",
            defaults.bollinger_period as i64,
        )?),
        bollinger_mult: adapter.get_double("indicators", "bollinger_mult", defaults.bollinger_mult)?,
        percentile_window: non_negative(adapter.get_int(
            "indicators",
            "percentile_window",
            defaults.percentile_window as i64,
        )?),
    })
}

/// The configured bank, or the default 32-strategy bank.
pub fn build_strategies(adapter: &dyn ConfigPort) -> Result<Vec<StrategyConfig>, IdxtraderError> {
    match adapter.get_string("strategies", "bank") {
        Some(s) if !s.trim().is_empty() => parse_bank(&s),
        _ => Ok(default_bank()),
    }
}

pub fn build_summary_config(adapter: &dyn ConfigPort) -> Result<SummaryConfig, IdxtraderError> {
    let defaults = SummaryConfig::default();
    Ok(SummaryConfig {
        min_position_rate: adapter.get_double(
            "summary",
            "min_position_rate",
            defaults.min_position_rate,
        )?,
    })
}

/// `today` is used when `[filter] as_of` is absent.
pub fn build_filter_config(
    adapter: &dyn ConfigPort,
    today: NaiveDate,
) -> Result<FilterConfig, IdxtraderError> {
    let defaults = FilterConfig::with_as_of(adapter.get_date("filter", "as_of")?.unwrap_or(today));
    let black_list = match adapter.get_string("filter", "black_list") {
        Some(s) => parse_codes(&s).map_err(|e| IdxtraderError::ConfigInvalid {
            section: "filter".into(),
            key: "black_list".into(),
            reason: e.to_string(),
        })?,
        None => defaults.black_list,
    };
    Ok(FilterConfig {
        min_years: u32::try_from(adapter.get_int("filter", "min_years", defaults.min_years as i64)?)
            .unwrap_or(0),
        require_tracking_fund: adapter.get_bool(
            "filter",
            "require_tracking_fund",
            defaults.require_tracking_fund,
        )?,
        black_list,
        as_of: defaults.as_of,
    })
}

pub fn build_run_plan(adapter: &dyn ConfigPort) -> Result<RunPlan, IdxtraderError> {
    let timeout_secs = non_negative(adapter.get_int("batch", "timeout_secs", 0)?);
    Ok(RunPlan {
        indicators: build_indicator_config(adapter)?,
        backtest: build_backtest_config(adapter)?,
        strategies: build_strategies(adapter)?,
        summary: build_summary_config(adapter)?,
        threads: non_negative(adapter.get_int("batch", "threads", 0)?),
        timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs as u64)),
    })
}

fn non_negative(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

pub fn data_dir(adapter: &dyn ConfigPort) -> PathBuf {
    PathBuf::from(
        adapter
            .get_string("data", "dir")
            .unwrap_or_else(|| "data".to_string()),
    )
}

/// The data port selected by `[data] backend`: `csv` (default) or `sqlite`.
pub fn open_data_port(adapter: &dyn ConfigPort) -> Result<Box<dyn DataPort + Sync>, IdxtraderError> {
    match adapter.get_string("data", "backend").as_deref() {
        None | Some("csv") => Ok(Box::new(CsvAdapter::new(data_dir(adapter)))),
        #[cfg(feature = "sqlite")]
        Some("sqlite") => {
            use crate::adapters::sqlite_adapter::SqliteAdapter;
            let store = SqliteAdapter::from_config(adapter)?;
            store.initialize_schema()?;
            Ok(Box::new(store))
        }
        Some(other) => Err(IdxtraderError::ConfigInvalid {
            section: "data".into(),
            key: "backend".into(),
            reason: format!("backend '{other}' is not available in this build"),
        }),
    }
}

pub fn output_dir(adapter: &dyn ConfigPort, output_override: Option<&Path>) -> PathBuf {
    match output_override {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(
            adapter
                .get_string("output", "dir")
                .unwrap_or_else(|| "output".to_string()),
        ),
    }
}

/// Indices to run: the single `code_override` when given, otherwise the
/// filtered universe.
pub fn select_universe(
    data: &dyn DataPort,
    adapter: &dyn ConfigPort,
    code_override: Option<&str>,
    today: NaiveDate,
) -> Result<Vec<IndexMeta>, IdxtraderError> {
    let indices = data.list_indices()?;
    if let Some(code) = code_override {
        return indices
            .into_iter()
            .find(|m| m.code == code)
            .map(|m| vec![m])
            .ok_or_else(|| IdxtraderError::NoData {
                code: code.to_string(),
            });
    }
    let filter = build_filter_config(adapter, today)?;
    Ok(filter_indices(indices, &filter).eligible)
}

/// Run the batch and persist every successful index plus the home file.
pub fn run_backtest_pipeline(
    data: &(dyn DataPort + Sync),
    report: &dyn ReportPort,
    indices: &[IndexMeta],
    plan: &RunPlan,
) -> Result<BatchReport, IdxtraderError> {
    let batch = run_batch(data, indices, plan)?;
    for result in &batch.results {
        report.write_index(result)?;
    }
    report.write_home(&batch.home_records())?;
    Ok(batch)
}

fn run_backtest(config_path: &Path, code: Option<&str>, output: Option<&Path>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    let plan = match build_run_plan(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let data = match open_data_port(&adapter) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };
    let indices = match select_universe(data.as_ref(), &adapter, code, Local::now().date_naive()) {
        Ok(i) => i,
        Err(e) => return fail(e),
    };
    if indices.is_empty() {
        warn!("no eligible indices");
    }

    let out_dir = output_dir(&adapter, output);
    let report = JsonReportAdapter::new(&out_dir);
    let batch = match run_backtest_pipeline(data.as_ref(), &report, &indices, &plan) {
        Ok(b) => b,
        Err(e) => return fail(e),
    };
    info!(output = %out_dir.display(), "reports written");

    print_summary(&batch);

    if batch.results.is_empty() && !batch.failures.is_empty() {
        error!("every index failed");
        return ExitCode::from(5);
    }
    ExitCode::SUCCESS
}

fn print_summary(batch: &BatchReport) {
    println!("{:<10} {:<24} {:>7} {:>24} {:>10}", "code", "name", "trades", "best strategy", "dur.rate");
    for r in &batch.results {
        let (best, rate) = r
            .result
            .stats
            .first()
            .map(|s| (s.strategy_name.as_str(), format!("{:.2}%", s.duration_adjusted_rate * 100.0)))
            .unwrap_or(("-", "-".to_string()));
        println!(
            "{:<10} {:<24} {:>7} {:>24} {:>10}",
            r.meta.code,
            r.meta.name,
            r.result.log.len(),
            best,
            rate
        );
    }
    for f in &batch.failures {
        println!("{:<10} FAILED: {}", f.code, f.reason);
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    let plan = match build_run_plan(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    info!("config validated successfully");

    println!("Strategy bank ({} strategies):", plan.strategies.len());
    for s in &plan.strategies {
        println!(
            "  {:<18} buy {:.2}  sell {:.2}",
            s.name, s.buy_threshold, s.sell_threshold
        );
    }

    let data = match open_data_port(&adapter) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };
    match select_universe(data.as_ref(), &adapter, None, Local::now().date_naive()) {
        Ok(indices) => println!("Eligible indices: {}", indices.len()),
        Err(e) => return fail(e),
    }
    ExitCode::SUCCESS
}

/// Copy every index in the CSV data directory into the SQLite store.
///
/// Returns the number of indices and bars written.
#[cfg(feature = "sqlite")]
pub fn import_csv(
    source: &CsvAdapter,
    store: &crate::adapters::sqlite_adapter::SqliteAdapter,
) -> Result<(usize, usize), IdxtraderError> {
    store.initialize_schema()?;
    let indices = source.list_indices()?;
    store.insert_indices(&indices)?;
    let mut bar_count = 0;
    for meta in &indices {
        let bars = match source.fetch_bars(&meta.code) {
            Ok(b) => b,
            Err(IdxtraderError::NoData { code }) => {
                warn!(code = %code, "no bar file, skipping");
                continue;
            }
            Err(e) => return Err(e),
        };
        store.insert_bars(&bars)?;
        info!(code = %meta.code, bars = bars.len(), "imported");
        bar_count += bars.len();
    }
    Ok((indices.len(), bar_count))
}

fn run_import(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let store = match SqliteAdapter::from_config(&adapter) {
            Ok(s) => s,
            Err(e) => return fail(e),
        };
        let source = CsvAdapter::new(data_dir(&adapter));
        match import_csv(&source, &store) {
            Ok((indices, bars)) => {
                println!("Imported {indices} indices, {bars} bars");
                ExitCode::SUCCESS
            }
            Err(e) => fail(e),
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = adapter;
        error!("sqlite feature is required for import");
        ExitCode::from(1)
    }
}

fn run_info(config_path: &Path, code: &str) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    let indicators = match build_indicator_config(&adapter) {
        Ok(i) => i,
        Err(e) => return fail(e),
    };

    let data = match open_data_port(&adapter) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };
    let bars = match data.fetch_bars(code) {
        Ok(b) => b,
        Err(e) => return fail(e),
    };
    let enriched = enrich(&normalize(bars), &indicators);
    let Some(latest) = enriched.last() else {
        return fail(IdxtraderError::NoData {
            code: code.to_string(),
        });
    };

    match serde_json::to_string_pretty(latest) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e.into()),
    }
}
