use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, bail};
use api_client::{MarketDataClient, YahooChartClient};
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use core_types::DailyBar;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

/// The main entry point for the MRAS dashboard toolkit.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Fetch(args) => handle_fetch(args).await,
        Commands::Report(args) => handle_report(args),
        Commands::Serve => handle_serve().await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Fetches index price history and serves the multi-regime strategy dashboard.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download historical index prices and write them to a CSV file.
    Fetch(FetchArgs),
    /// Compute and print the performance metrics of the master frame.
    Report(ReportArgs),
    /// Run the dashboard API server over the master frame.
    Serve,
}

#[derive(Parser)]
struct FetchArgs {
    /// The index symbol to download (defaults to the configured symbol).
    #[arg(long)]
    symbol: Option<String>,

    /// The start date for the download (format: YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// The end date for the download (format: YYYY-MM-DD; defaults to today).
    #[arg(long)]
    to: Option<NaiveDate>,
}

#[derive(Parser)]
struct ReportArgs {
    /// Path to the master frame CSV (defaults to the configured path).
    #[arg(long)]
    file: Option<PathBuf>,
}

// ==============================================================================
// Fetch Command Logic
// ==============================================================================

/// Handles the orchestration of the download process.
async fn handle_fetch(args: FetchArgs) -> anyhow::Result<()> {
    let settings = configuration::load_config()?;
    let symbol = args.symbol.unwrap_or_else(|| settings.data.symbol.clone());
    let from = args.from.unwrap_or(settings.data.start_date);
    let to = args.to.unwrap_or_else(|| Utc::now().date_naive());

    println!("Downloading {symbol} from {from} to {to} ...");

    // Fetch yearly chunks concurrently to keep individual responses small.
    let date_ranges = generate_yearly_ranges(from, to);

    let progress_bar = ProgressBar::new(date_ranges.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );

    let client = YahooChartClient::new();
    let tasks: Vec<_> = date_ranges
        .into_iter()
        .map(|(start, end)| {
            let client = client.clone();
            let symbol = symbol.clone();
            let pb = progress_bar.clone();

            tokio::spawn(async move {
                pb.set_message(format!("Fetching {}...", start.year()));
                let bars = client.fetch_daily_bars(&symbol, start, end).await;
                pb.inc(1);
                bars
            })
        })
        .collect();

    let results = join_all(tasks).await;
    progress_bar.finish_with_message("Download complete");

    let mut bars: Vec<DailyBar> = Vec::new();
    for result in results {
        match result.context("download task panicked")? {
            Ok(chunk) => bars.extend(chunk),
            // A chunk with no trading days (e.g., a not-yet-started year) is
            // fine as long as the merged set is non-empty.
            Err(api_client::error::ApiError::NoData(_)) => {}
            Err(e) => tracing::warn!(error = %e, "a download chunk failed"),
        }
    }

    bars.sort_by_key(|bar| bar.date);
    bars.dedup_by_key(|bar| bar.date);

    if bars.is_empty() {
        bail!("Downloaded dataset is empty. Check the symbol or connectivity.");
    }

    let out_path = settings.data.price_path(&symbol);
    dataset::save_daily_bars(&out_path, &bars)?;
    println!("Saved {} (rows: {})", out_path.display(), bars.len());

    Ok(())
}

/// Generates (start, end) tuples covering each calendar year between the
/// from and to dates.
fn generate_yearly_ranges(from: NaiveDate, to: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    let mut ranges = Vec::new();
    let mut start = from;

    while start <= to {
        let end_of_year = NaiveDate::from_ymd_opt(start.year(), 12, 31).unwrap();
        let end = std::cmp::min(end_of_year, to);
        ranges.push((start, end));

        let Some(next) = end.succ_opt() else { break };
        start = next;
    }

    ranges
}

// ==============================================================================
// Report Command Logic
// ==============================================================================

/// Loads the master frame and prints the metrics tables.
fn handle_report(args: ReportArgs) -> anyhow::Result<()> {
    let settings = configuration::load_config()?;
    let path = args.file.unwrap_or_else(|| settings.data.master_path.clone());

    let frame = dataset::MasterFrame::from_path(&path)
        .with_context(|| format!("could not load master frame at {}", path.display()))?;
    let nav = frame.nav_series(&settings.data.nav_column)?;
    let regimes = frame.regime_series(&settings.data.regime_column)?;
    let positions = frame.position_series(&settings.data.position_column)?;

    let engine = analytics::MetricsEngine::new();
    let summary = engine.summary(&nav)?;

    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Total Return".to_string(), fmt_pct(summary.total_return)]);
    table.add_row(vec!["CAGR".to_string(), fmt_pct(summary.cagr)]);
    table.add_row(vec![
        "Annual Vol".to_string(),
        fmt_pct(summary.annualized_volatility),
    ]);
    table.add_row(vec!["Sharpe".to_string(), fmt_ratio(summary.sharpe_ratio)]);
    table.add_row(vec![
        "Max Drawdown".to_string(),
        fmt_pct(summary.max_drawdown),
    ]);
    println!("{table}");

    match regimes {
        Some(regimes) => {
            let diagnostics = engine.regime_diagnostics(&nav, &regimes, positions.as_ref());

            let mut table = Table::new();
            table.set_header(vec![
                "State",
                "Total Ret",
                "Annual Vol",
                "Days Frac",
                "Days Invested",
            ]);
            for (label, stats) in &diagnostics {
                table.add_row(vec![
                    label.to_string(),
                    fmt_pct(stats.total_return),
                    fmt_pct(stats.annualized_volatility),
                    format!("{:.2}", stats.fraction_of_days),
                    stats.days_invested.to_string(),
                ]);
            }
            println!("{table}");
        }
        None => println!(
            "Regime column '{}' not found in data.",
            settings.data.regime_column
        ),
    }

    Ok(())
}

fn fmt_pct(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.2}%", value * 100.0)
    }
}

fn fmt_ratio(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{value:.2}")
    }
}

// ==============================================================================
// Serve Command Logic
// ==============================================================================

async fn handle_serve() -> anyhow::Result<()> {
    let settings = configuration::load_config()?;
    let state = web_server::AppState::from_settings(&settings)?;

    let host: IpAddr = settings
        .dashboard
        .host
        .parse()
        .context("invalid dashboard host in config.toml")?;
    let addr = SocketAddr::new(host, settings.dashboard.port);
    web_server::run_server(addr, state).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn yearly_ranges_cover_the_span_without_overlap() {
        let ranges = generate_yearly_ranges(d(2013, 6, 1), d(2015, 3, 15));
        assert_eq!(
            ranges,
            vec![
                (d(2013, 6, 1), d(2013, 12, 31)),
                (d(2014, 1, 1), d(2014, 12, 31)),
                (d(2015, 1, 1), d(2015, 3, 15)),
            ]
        );
    }

    #[test]
    fn single_day_range_is_one_chunk() {
        let ranges = generate_yearly_ranges(d(2024, 2, 2), d(2024, 2, 2));
        assert_eq!(ranges, vec![(d(2024, 2, 2), d(2024, 2, 2))]);
    }

    #[test]
    fn nan_metrics_format_as_not_available() {
        assert_eq!(fmt_pct(f64::NAN), "n/a");
        assert_eq!(fmt_ratio(f64::NAN), "n/a");
        assert_eq!(fmt_pct(0.2146), "21.46%");
        assert_eq!(fmt_ratio(1.234), "1.23");
    }
}
