//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the pairlab analytics engine.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::adapters::{CsvPriceData, SyntheticPriceData};
use crate::application::AnalyticsSession;
use crate::backtest::BacktestReport;
use crate::config::{load_config, Config};
use crate::domain::{AnnotatedPair, CorrelationMethod, MeanReversionEstimate, PairCorrelationRecord};
use crate::ports::{PriceDataPort, PriceQuery};

/// Config file picked up when `--config` is not given
const DEFAULT_CONFIG_PATH: &str = "config/pairlab.toml";

/// pairlab - Statistical arbitrage pair analytics
#[derive(Parser, Debug)]
#[command(
    name = "pairlab",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Statistical arbitrage pair analytics",
    long_about = "pairlab screens a universe of tickers for co-moving pairs, estimates \
                  the mean-reversion speed of a pair's return spread, and backtests a \
                  z-score threshold rule on the price ratio."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Wide CSV of daily closes (overrides data.prices_file)
    #[arg(long, global = true, value_name = "FILE", conflicts_with = "synthetic")]
    pub prices: Option<PathBuf>,

    /// Use the seeded synthetic universe instead of a price file
    #[arg(long, global = true)]
    pub synthetic: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Output format for command results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rank the most co-moving pairs
    Pairs(PairsCmd),

    /// Estimate the mean-reversion speed of a pair's return spread
    MeanReversion(MeanReversionCmd),

    /// Backtest the z-score threshold rule on a pair
    Backtest(BacktestCmd),

    /// Show the tickers and date range of the price source
    Universe(UniverseCmd),
}

/// Rank pairs
#[derive(Parser, Debug)]
pub struct PairsCmd {
    /// Correlation method: pearson, spearman, ols or kalman (default from config)
    #[arg(short, long, value_name = "METHOD")]
    pub method: Option<CorrelationMethod>,

    /// First date of the window (YYYY-MM-DD), defaults to the first available
    #[arg(long, value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Last date of the window (YYYY-MM-DD), defaults to the last available
    #[arg(long, value_name = "DATE")]
    pub end: Option<NaiveDate>,

    /// Number of pairs to show (default from config)
    #[arg(short = 'n', long, value_name = "N")]
    pub top: Option<usize>,

    /// Annotate each pair with its spread's mean-reversion speed
    #[arg(long)]
    pub with_mean_reversion: bool,
}

/// Estimate mean-reversion speed
#[derive(Parser, Debug)]
pub struct MeanReversionCmd {
    /// First leg
    #[arg(value_name = "TICKER_A")]
    pub ticker_a: String,

    /// Second leg
    #[arg(value_name = "TICKER_B")]
    pub ticker_b: String,

    #[arg(long, value_name = "DATE")]
    pub start: Option<NaiveDate>,

    #[arg(long, value_name = "DATE")]
    pub end: Option<NaiveDate>,
}

/// Run backtesting
#[derive(Parser, Debug)]
pub struct BacktestCmd {
    /// Long leg of the ratio (numerator)
    #[arg(value_name = "TICKER_A")]
    pub ticker_a: String,

    /// Short leg of the ratio (denominator)
    #[arg(value_name = "TICKER_B")]
    pub ticker_b: String,

    #[arg(long, value_name = "DATE")]
    pub start: Option<NaiveDate>,

    #[arg(long, value_name = "DATE")]
    pub end: Option<NaiveDate>,

    /// Override lookback period
    #[arg(long, value_name = "ROWS")]
    pub lookback: Option<usize>,

    /// Override the low z-score band (long trigger)
    #[arg(long, value_name = "Z", allow_hyphen_values = true)]
    pub low: Option<f64>,

    /// Override the high z-score band (short trigger)
    #[arg(long, value_name = "Z", allow_hyphen_values = true)]
    pub high: Option<f64>,

    /// Override hold days
    #[arg(long, value_name = "DAYS")]
    pub hold_days: Option<usize>,

    /// Number of trailing rows to print in text mode
    #[arg(long, value_name = "ROWS", default_value = "10")]
    pub tail: usize,

    /// Export backtest rows to CSV
    #[arg(long, value_name = "FILE")]
    pub export_csv: Option<PathBuf>,
}

/// Show the price universe
#[derive(Parser, Debug)]
pub struct UniverseCmd {}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let config = resolve_config(app.config.as_deref())?;

    // Initialize logging based on flags
    init_logging(app.verbose, app.debug, &config.logging.level)?;

    let source = price_source(&app, &config)?;
    let format = app.format;

    match app.command {
        Command::Pairs(cmd) => pairs_command(cmd, source.as_ref(), &config, format).await,
        Command::MeanReversion(cmd) => {
            mean_reversion_command(cmd, source.as_ref(), &config, format).await
        }
        Command::Backtest(cmd) => backtest_command(cmd, source.as_ref(), &config, format).await,
        Command::Universe(cmd) => universe_command(cmd, source.as_ref(), &config, format).await,
    }
}

/// Explicit `--config`, else the default path if present, else built-in defaults
fn resolve_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => load_config(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load configuration from {}", DEFAULT_CONFIG_PATH)),
        None => Ok(Config::default()),
    }
}

/// Initialize logging system
fn init_logging(verbose: bool, debug: bool, configured_level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        configured_level
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

fn price_source(app: &CliApp, config: &Config) -> Result<Box<dyn PriceDataPort>> {
    if app.synthetic {
        let source = SyntheticPriceData::from_config(&config.synthetic)
            .context("Failed to generate synthetic universe")?;
        tracing::info!(seed = config.synthetic.seed, "Using synthetic price source");
        return Ok(Box::new(source));
    }

    let path = app
        .prices
        .as_ref()
        .map(|p| shellexpand::tilde(&p.to_string_lossy()).to_string())
        .or_else(|| config.data.get_prices_file());

    match path {
        Some(path) => {
            tracing::info!("Using price file {}", path);
            Ok(Box::new(CsvPriceData::new(path)))
        }
        None => bail!(
            "No price source: pass --prices FILE, --synthetic, set data.prices_file or {}",
            crate::config::PRICES_FILE_ENV
        ),
    }
}

/// Load the full history; operations slice their own windows
async fn load_session(source: &dyn PriceDataPort, config: &Config) -> Result<AnalyticsSession> {
    let query = PriceQuery::new(NaiveDate::MIN, NaiveDate::MAX);
    AnalyticsSession::load(source, query, config)
        .await
        .context("Failed to load price data")
}

fn window(
    session: &AnalyticsSession,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(NaiveDate, NaiveDate)> {
    let panel = session.panel();
    let start = start
        .or_else(|| panel.first_date())
        .ok_or_else(|| anyhow!("Price panel is empty"))?;
    let end = end
        .or_else(|| panel.last_date())
        .ok_or_else(|| anyhow!("Price panel is empty"))?;
    Ok((start, end))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

/// Handle pairs command
async fn pairs_command(
    cmd: PairsCmd,
    source: &dyn PriceDataPort,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let session = load_session(source, config).await?;
    let (start, end) = window(&session, cmd.start, cmd.end)?;
    let method = cmd.method.unwrap_or(config.screen.method);
    let top_n = cmd.top.unwrap_or(config.screen.top_n);
    tracing::info!("Ranking pairs by {} from {} to {}", method, start, end);

    if cmd.with_mean_reversion {
        let pairs = session
            .rank_pairs_with_mean_reversion(method, start, end, top_n)
            .context("Failed to rank pairs")?;
        return match format {
            OutputFormat::Json => print_json(&pairs),
            OutputFormat::Text => {
                print_annotated_pairs(&pairs, method, start, end);
                Ok(())
            }
        };
    }

    let pairs = session
        .rank_pairs(method, start, end, top_n)
        .context("Failed to rank pairs")?;
    match format {
        OutputFormat::Json => print_json(&pairs),
        OutputFormat::Text => {
            print_pairs(&pairs, method, start, end);
            Ok(())
        }
    }
}

fn print_pairs(pairs: &[PairCorrelationRecord], method: CorrelationMethod, start: NaiveDate, end: NaiveDate) {
    println!("Top pairs by {} ({} to {})", method, start, end);
    println!();
    println!("  {:>3}  {:<10} {:<10} {:>10}", "#", "Ticker A", "Ticker B", method.as_str());
    for (i, pair) in pairs.iter().enumerate() {
        println!(
            "  {:>3}  {:<10} {:<10} {:>10.4}",
            i + 1,
            pair.ticker_a,
            pair.ticker_b,
            pair.score
        );
    }
    if pairs.is_empty() {
        println!("  (no pair with a defined score)");
    }
}

fn print_annotated_pairs(pairs: &[AnnotatedPair], method: CorrelationMethod, start: NaiveDate, end: NaiveDate) {
    println!("Top pairs by {} with mean-reversion speed ({} to {})", method, start, end);
    println!();
    println!(
        "  {:>3}  {:<10} {:<10} {:>10} {:>8} {:>10}",
        "#", "Ticker A", "Ticker B", method.as_str(), "theta", "half-life"
    );
    for (i, pair) in pairs.iter().enumerate() {
        let mr = &pair.mean_reversion;
        println!(
            "  {:>3}  {:<10} {:<10} {:>10.4} {:>8.3} {:>10.2}{}",
            i + 1,
            pair.record.ticker_a,
            pair.record.ticker_b,
            pair.record.score,
            mr.theta,
            mr.half_life,
            if mr.is_fallback { "  (fallback)" } else { "" }
        );
    }
}

/// Handle mean-reversion command
async fn mean_reversion_command(
    cmd: MeanReversionCmd,
    source: &dyn PriceDataPort,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let session = load_session(source, config).await?;
    let (start, end) = window(&session, cmd.start, cmd.end)?;

    let estimate = session
        .estimate_mean_reversion(&cmd.ticker_a, &cmd.ticker_b, start, end)
        .with_context(|| {
            format!(
                "Failed to estimate mean reversion for {}/{}",
                cmd.ticker_a, cmd.ticker_b
            )
        })?;

    match format {
        OutputFormat::Json => print_json(&estimate),
        OutputFormat::Text => {
            print_estimate(&cmd.ticker_a, &cmd.ticker_b, start, end, &estimate);
            Ok(())
        }
    }
}

fn print_estimate(a: &str, b: &str, start: NaiveDate, end: NaiveDate, est: &MeanReversionEstimate) {
    println!("Mean reversion of {} - {} returns ({} to {})", a, b, start, end);
    println!();
    println!("  Theta:          {:.4} per day", est.theta);
    if est.is_fallback {
        println!("  Status:         FALLBACK (regression degenerate, default speed reported)");
    } else {
        println!("  Half-life:      {:.2} days", est.half_life);
        println!("  Beta (lag):     {:.4}  (t = {:.2})", est.beta, est.beta_t_stat);
        println!("  Intercept:      {:.6}  (t = {:.2})", est.intercept, est.intercept_t_stat);
    }
    println!("  Observations:   {}", est.observations);
}

/// Handle backtest command
async fn backtest_command(
    cmd: BacktestCmd,
    source: &dyn PriceDataPort,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let session = load_session(source, config).await?;
    let (start, end) = window(&session, cmd.start, cmd.end)?;

    let mut params = config.backtest;
    if let Some(lookback) = cmd.lookback {
        params = params.with_lookback(lookback);
    }
    if cmd.low.is_some() || cmd.high.is_some() {
        params = params.with_bands(
            cmd.low.unwrap_or(params.low_quantile),
            cmd.high.unwrap_or(params.high_quantile),
        );
    }
    if let Some(hold_days) = cmd.hold_days {
        params = params.with_hold_days(hold_days);
    }

    tracing::info!(
        "Backtesting {}/{} from {} to {} (lookback {}, bands {}/{}, hold {})",
        cmd.ticker_a,
        cmd.ticker_b,
        start,
        end,
        params.lookback,
        params.low_quantile,
        params.high_quantile,
        params.hold_days
    );

    let report = session
        .run_backtest(&cmd.ticker_a, &cmd.ticker_b, start, end, &params)
        .with_context(|| format!("Backtest failed for {}/{}", cmd.ticker_a, cmd.ticker_b))?;

    if let Some(path) = &cmd.export_csv {
        export_rows(&report, path)?;
        tracing::info!("Exported {} rows to {}", report.rows.len(), path.display());
    }

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            print_report(&report, cmd.tail);
            Ok(())
        }
    }
}

fn export_rows(report: &BacktestReport, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    for row in &report.rows {
        writer.serialize(row).context("Failed to write backtest row")?;
    }
    writer.flush()?;
    Ok(())
}

fn print_report(report: &BacktestReport, tail: usize) {
    let params = &report.params;
    let first = report.rows.first().map(|r| r.date.to_string()).unwrap_or_default();
    let last = report.rows.last().map(|r| r.date.to_string()).unwrap_or_default();

    println!("======================================");
    println!("  Backtest {} / {}", report.ticker_a, report.ticker_b);
    println!("======================================");
    println!();
    println!("  Rows:            {} ({} to {})", report.rows.len(), first, last);
    println!("  Lookback:        {}", params.lookback);
    println!("  Bands:           {} / {}", params.low_quantile, params.high_quantile);
    println!("  Hold days:       {}", params.hold_days);
    println!("  Long days:       {}", report.long_days());
    println!("  Short days:      {}", report.short_days());
    println!("  Final PnL:       {:.4}", report.final_pnl());
    println!();
    println!("  {}", report.performance);
    if let Some(point) = report.rolling_correlation.last() {
        println!("  Rolling corr:    {:.3} (as of {})", point.correlation, point.date);
    }

    if tail > 0 {
        println!();
        println!(
            "  {:<10} {:>9} {:>8} {:>5} {:>5} {:>9} {:>10}",
            "Date", "Ratio", "Z", "Long", "Short", "PnL", "Cum PnL"
        );
        let skip = report.rows.len().saturating_sub(tail);
        for row in report.rows.iter().skip(skip) {
            println!(
                "  {:<10} {:>9.4} {:>8.3} {:>5} {:>5} {:>9.4} {:>10.4}",
                row.date.to_string(),
                row.ratio,
                row.zscore,
                if row.long_signal { "L" } else { "" },
                if row.short_signal { "S" } else { "" },
                row.pnl,
                row.cumulative_pnl
            );
        }
    }
}

/// Price universe summary
#[derive(Debug, Serialize)]
struct UniverseSummary {
    tickers: Vec<String>,
    rows: usize,
    first_date: Option<NaiveDate>,
    last_date: Option<NaiveDate>,
}

/// Handle universe command
async fn universe_command(
    _cmd: UniverseCmd,
    source: &dyn PriceDataPort,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let tickers = source
        .list_tickers()
        .await
        .context("Failed to list tickers")?;
    let session = load_session(source, config).await?;
    let panel = session.panel();

    let summary = UniverseSummary {
        tickers,
        rows: panel.len(),
        first_date: panel.first_date(),
        last_date: panel.last_date(),
    };

    match format {
        OutputFormat::Json => print_json(&summary),
        OutputFormat::Text => {
            println!("Tickers ({}): {}", summary.tickers.len(), summary.tickers.join(", "));
            println!("Rows:          {}", summary.rows);
            if let (Some(first), Some(last)) = (summary.first_date, summary.last_date) {
                println!("Date range:    {} to {}", first, last);
            }
            Ok(())
        }
    }
}
