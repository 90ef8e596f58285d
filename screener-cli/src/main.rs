//! Screener CLI: scan a ticker universe for Supertrend crossovers.
//!
//! Commands:
//! - `scan`: evaluate every ticker and list those whose close crossed above
//!   the Supertrend on the latest bar
//! - `universe`: print the resolved ticker universe without scanning

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::prelude::*;

use screener_core::data::{
    CircuitBreaker, ConstituentsCsv, CsvDirProvider, DataProvider, Lookback, StaticUniverse,
    Universe, UniverseProvider, YahooProvider,
};
use screener_runner::{
    run_scan, ScanConfig, ScanError, ScanProgress, ScanReport, StderrProgress,
};

#[derive(Parser)]
#[command(
    name = "screener",
    about = "Supertrend crossover screener: find tickers crossing above the Supertrend today"
)]
struct Cli {
    /// Log at DEBUG level (per-ticker misses, provider retries).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the universe and report tickers crossing above the Supertrend.
    Scan {
        #[command(flatten)]
        source: SourceArgs,

        /// ATR period.
        #[arg(long)]
        period: Option<usize>,

        /// ATR multiplier.
        #[arg(long)]
        multiplier: Option<f64>,

        /// History window per ticker (e.g. 1y, 6mo, 90d).
        #[arg(long)]
        lookback: Option<Lookback>,

        /// Maximum tickers evaluated at once.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Per-ticker fetch timeout in seconds (0 disables it).
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Read bars from `<DIR>/<SYMBOL>.csv` instead of Yahoo Finance.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Print the report as JSON on stdout.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the resolved ticker universe.
    Universe {
        #[command(flatten)]
        source: SourceArgs,
    },
}

/// Where configuration and tickers come from. Explicit tickers win over a
/// universe file, which wins over the constituents URL.
#[derive(Args)]
struct SourceArgs {
    /// Path to a TOML scan config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sector universe TOML file.
    #[arg(long)]
    universe_file: Option<PathBuf>,

    /// Explicit tickers to scan.
    #[arg(long, num_args = 1..)]
    tickers: Vec<String>,

    /// Constituents CSV URL (needs a `Symbol` column).
    #[arg(long)]
    constituents_url: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Scan {
            source,
            period,
            multiplier,
            lookback,
            concurrency,
            timeout_secs,
            data_dir,
            json,
        } => {
            let mut config = load_config(&source)?;
            if let Some(period) = period {
                config.indicator.period = period;
            }
            if let Some(multiplier) = multiplier {
                config.indicator.multiplier = multiplier;
            }
            if let Some(lookback) = lookback {
                config.scan.lookback = lookback;
            }
            if let Some(concurrency) = concurrency {
                config.scan.concurrency = concurrency;
            }
            if let Some(secs) = timeout_secs {
                config.scan.fetch_timeout_secs = secs;
            }
            run_scan_cmd(&config, data_dir, json)
        }
        Commands::Universe { source } => {
            let config = load_config(&source)?;
            let tickers = resolve_universe(&config)?
                .load()
                .map_err(ScanError::UniverseUnavailable)?;
            for ticker in &tickers {
                println!("{ticker}");
            }
            eprintln!("{} tickers", tickers.len());
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(
            tracing_subscriber::filter::Targets::new()
                .with_target("reqwest", tracing::Level::WARN)
                .with_default(level),
        );
    tracing_subscriber::registry().with(fmt_layer).init();
}

/// Config file (or defaults) with the universe flags applied.
fn load_config(source: &SourceArgs) -> Result<ScanConfig> {
    let mut config = match &source.config {
        Some(path) => ScanConfig::from_file(path)?,
        None => ScanConfig::default(),
    };
    if !source.tickers.is_empty() {
        config.universe.tickers = source.tickers.clone();
    }
    if let Some(file) = &source.universe_file {
        config.universe.file = Some(file.clone());
    }
    if let Some(url) = &source.constituents_url {
        config.universe.constituents_url = url.clone();
    }
    Ok(config)
}

fn resolve_universe(config: &ScanConfig) -> Result<Box<dyn UniverseProvider>> {
    let universe = &config.universe;
    if !universe.tickers.is_empty() {
        return Ok(Box::new(StaticUniverse::new(&universe.tickers)));
    }
    if let Some(path) = &universe.file {
        let sectors = Universe::from_file(path).map_err(ScanError::UniverseUnavailable)?;
        return Ok(Box::new(sectors));
    }
    let remote =
        ConstituentsCsv::new(&universe.constituents_url).map_err(ScanError::UniverseUnavailable)?;
    Ok(Box::new(remote))
}

fn run_scan_cmd(config: &ScanConfig, data_dir: Option<PathBuf>, json: bool) -> Result<()> {
    let options = config.to_options()?;
    let universe = resolve_universe(config)?;

    let provider: Arc<dyn DataProvider> = match data_dir {
        Some(dir) => Arc::new(CsvDirProvider::new(dir)),
        None => {
            let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
            Arc::new(YahooProvider::new(circuit_breaker).context("create Yahoo Finance provider")?)
        }
    };

    let cancel = Arc::new(AtomicBool::new(false));
    watch_interrupt(Arc::clone(&cancel))?;

    // Progress lines go to stderr and are off in JSON mode.
    let progress: Option<&dyn ScanProgress> = if json { None } else { Some(&StderrProgress) };
    let report = run_scan(universe.as_ref(), provider, &options, progress, Some(cancel.as_ref()))?;

    let (_, as_of) = options.date_range();
    if json {
        print_json(&report, config, as_of)?;
    } else {
        print_report(&report);
    }
    Ok(())
}

/// First Ctrl-C sets `cancel`: tickers not yet started are skipped and the
/// partial report is still printed. A second Ctrl-C exits immediately.
fn watch_interrupt(cancel: Arc<AtomicBool>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("build signal runtime")?;
    std::thread::Builder::new()
        .name("interrupt".into())
        .spawn(move || {
            runtime.block_on(async {
                if !cancel_on(tokio::signal::ctrl_c(), &cancel).await {
                    return;
                }
                if tokio::signal::ctrl_c().await.is_ok() {
                    std::process::exit(130);
                }
            })
        })
        .context("spawn interrupt watcher")?;
    Ok(())
}

/// Wait for `signal`, then raise `cancel`. Returns false if the signal
/// could not be awaited.
async fn cancel_on<F>(signal: F, cancel: &AtomicBool) -> bool
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            tracing::warn!("interrupt received, finishing in-flight tickers");
            cancel.store(true, Ordering::Relaxed);
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not listen for Ctrl-C");
            false
        }
    }
}

fn print_report(report: &ScanReport) {
    let crossed = report.crossed();
    println!(
        "Found {} stocks crossing above Supertrend today.",
        crossed.len()
    );
    if report.cancelled {
        println!(
            "Scan interrupted: {} tickers were not evaluated.",
            report.summary().skipped
        );
    }
    if crossed.is_empty() {
        println!("No stocks crossed above the Supertrend today.");
        return;
    }

    println!();
    println!("{:<4} {:<10}", "#", "Ticker");
    println!("{}", "-".repeat(15));
    for (i, ticker) in crossed.iter().enumerate() {
        println!("{:<4} {:<10}", i + 1, ticker);
    }
}

fn print_json(report: &ScanReport, config: &ScanConfig, as_of: chrono::NaiveDate) -> Result<()> {
    let failures: Vec<serde_json::Value> = report
        .failures()
        .map(|(symbol, failure)| {
            serde_json::json!({ "symbol": symbol, "error": failure.to_string() })
        })
        .collect();
    let out = serde_json::json!({
        "as_of": as_of.to_string(),
        "period": config.indicator.period,
        "multiplier": config.indicator.multiplier,
        "lookback": config.scan.lookback.to_string(),
        "crossed": report.crossed(),
        "summary": report.summary(),
        "failures": failures,
        "cancelled": report.cancelled,
        "elapsed_ms": report.elapsed.as_millis() as u64,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
