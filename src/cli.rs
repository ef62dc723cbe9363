//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::read_bars;
use crate::adapters::csv_report_adapter::{CsvReportAdapter, write_enrichment_csv};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestOutcome, run_backtest};
use crate::domain::config::AnalysisConfig;
use crate::domain::error::CryptotaError;
use crate::domain::fusion::Signal;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::pipeline::{Enrichment, enrich};
use crate::domain::resample::Timeframe;
use crate::ports::data_port::MarketDataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "cryptota", about = "Technical-analysis enrichment and signal backtesting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enrich a bar file with indicators, pattern flags and signals
    Enrich {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        /// Resample rule, overriding `[data] timeframe`
        #[arg(short, long)]
        timeframe: Option<String>,
        /// Enriched CSV path; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Backtest the fused signals of a bar file
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        timeframe: Option<String>,
        /// Equity curve CSV path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Trade ledger CSV path
        #[arg(long)]
        trades: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Installs a stderr fmt subscriber filtered by `RUST_LOG` (default `info`).
/// A second call is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing();
    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn execute(command: Command) -> Result<(), CryptotaError> {
    match command {
        Command::Enrich {
            config,
            data,
            timeframe,
            output,
        } => run_enrich(&config, &data, timeframe.as_deref(), output.as_deref()),
        Command::Backtest {
            config,
            data,
            timeframe,
            output,
            trades,
        } => {
            let outcome = run_backtest_command(
                &config,
                &data,
                timeframe.as_deref(),
                output.as_deref(),
                trades.as_deref(),
            )?;
            print!("{}", CsvReportAdapter::new().summary(&outcome.report));
            Ok(())
        }
        Command::Validate { config } => run_validate(&config),
    }
}

/// Loads the INI file at `path`; a `--timeframe` override replaces `[data] timeframe`.
pub fn load_analysis_config(path: &Path, timeframe: Option<&str>) -> Result<AnalysisConfig, CryptotaError> {
    eprintln!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path)?;
    let mut config = AnalysisConfig::from_port(&adapter)?;
    if let Some(rule) = timeframe {
        config.timeframe = Some(Timeframe::parse(rule)?);
    }
    Ok(config)
}

fn load_bars(path: &Path) -> Result<Vec<OhlcvBar>, CryptotaError> {
    eprintln!("Loading bars from {}", path.display());
    read_bars(path)
}

fn log_signal_counts(enrichment: &Enrichment) {
    let count = |s: Signal| enrichment.bars.iter().filter(|b| b.signal == s).count();
    eprintln!(
        "Enriched {} bars: {} buy, {} sell, {} chart formations",
        enrichment.bars.len(),
        count(Signal::Buy),
        count(Signal::Sell),
        enrichment.formations.len()
    );
}

pub fn run_enrich(
    config_path: &Path,
    data_path: &Path,
    timeframe: Option<&str>,
    output_path: Option<&Path>,
) -> Result<(), CryptotaError> {
    let config = load_analysis_config(config_path, timeframe)?;
    let bars = load_bars(data_path)?;
    let enrichment = enrich(&bars, &config)?;
    log_signal_counts(&enrichment);

    match output_path {
        Some(path) => {
            CsvReportAdapter::new().write_enrichment(&enrichment, path)?;
            eprintln!("Enriched bars written to: {}", path.display());
        }
        None => write_enrichment_csv(io::stdout().lock(), &enrichment)?,
    }
    Ok(())
}

pub fn run_backtest_command(
    config_path: &Path,
    data_path: &Path,
    timeframe: Option<&str>,
    equity_path: Option<&Path>,
    trades_path: Option<&Path>,
) -> Result<BacktestOutcome, CryptotaError> {
    let config = load_analysis_config(config_path, timeframe)?;
    let bars = load_bars(data_path)?;
    run_backtest_pipeline(&bars, &config, &CsvReportAdapter::new(), equity_path, trades_path)
}

/// Enriches `bars`, replays the signals and writes whichever reports were requested.
pub fn run_backtest_pipeline(
    bars: &[OhlcvBar],
    config: &AnalysisConfig,
    report: &dyn ReportPort,
    equity_path: Option<&Path>,
    trades_path: Option<&Path>,
) -> Result<BacktestOutcome, CryptotaError> {
    let enrichment = enrich(bars, config)?;
    log_signal_counts(&enrichment);

    let outcome = run_backtest(&enrichment.bars, &config.risk);
    if let Some(path) = equity_path {
        report.write_equity_curve(&outcome.portfolio.equity_curve, path)?;
        eprintln!("Equity curve written to: {}", path.display());
    }
    if let Some(path) = trades_path {
        report.write_trades(&outcome.portfolio.closed_trades, path)?;
        eprintln!("Trade ledger written to: {}", path.display());
    }
    Ok(outcome)
}

/// Fetches `symbol` from a market data source and enriches it.
///
/// Library entry point for callers holding a [`MarketDataPort`], such as
/// [`CsvAdapter`](crate::adapters::csv_adapter::CsvAdapter) over a data
/// directory. The subcommands read a single `--data` file instead.
pub fn enrich_from_port(
    data_port: &dyn MarketDataPort,
    symbol: &str,
    timeframe: Timeframe,
    limit: Option<usize>,
    config: &AnalysisConfig,
) -> Result<Enrichment, CryptotaError> {
    let bars = data_port.fetch_ohlcv(symbol, timeframe, limit)?;
    tracing::info!(symbol, %timeframe, bars = bars.len(), "fetched bars");
    enrich(&bars, config)
}

pub fn run_validate(config_path: &Path) -> Result<(), CryptotaError> {
    let config = load_analysis_config(config_path, None)?;
    match config.timeframe {
        Some(tf) => eprintln!("  timeframe: {tf}"),
        None => eprintln!("  timeframe: native"),
    }
    eprintln!(
        "  risk: {:.2}% per trade, stop {}x ATR, target {}R",
        config.risk.max_risk_per_trade * 100.0,
        config.risk.stop_loss_atr_multiplier,
        config.risk.take_profit_rr
    );
    eprintln!("Config validated successfully");
    Ok(())
}
