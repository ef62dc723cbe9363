//! CSV report adapter: enriched bars, equity curve and trade ledger.
//!
//! Optional values are written as empty cells and flags as 0/1.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::divergence::DivergenceFlags;
use crate::domain::error::CryptotaError;
use crate::domain::indicator::IndicatorRow;
use crate::domain::levels::LEVEL_COUNT;
use crate::domain::metrics::PerformanceReport;
use crate::domain::patterns::candlestick::CandleFlags;
use crate::domain::patterns::chart::ChartFlags;
use crate::domain::pipeline::{EnrichedBar, Enrichment};
use crate::domain::portfolio::EquityPoint;
use crate::domain::position::Trade;
use crate::ports::report_port::ReportPort;
use chrono::NaiveDateTime;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_enrichment(&self, enrichment: &Enrichment, output_path: &Path) -> Result<(), CryptotaError> {
        write_enrichment_csv(File::create(output_path)?, enrichment)?;
        tracing::info!(path = %output_path.display(), rows = enrichment.bars.len(), "enrichment written");
        Ok(())
    }

    fn write_equity_curve(&self, curve: &[EquityPoint], output_path: &Path) -> Result<(), CryptotaError> {
        write_equity_csv(File::create(output_path)?, curve)?;
        tracing::info!(path = %output_path.display(), rows = curve.len(), "equity curve written");
        Ok(())
    }

    fn write_trades(&self, trades: &[Trade], output_path: &Path) -> Result<(), CryptotaError> {
        write_trades_csv(File::create(output_path)?, trades)?;
        tracing::info!(path = %output_path.display(), rows = trades.len(), "trade ledger written");
        Ok(())
    }

    fn summary(&self, report: &PerformanceReport) -> String {
        format_summary(report)
    }
}

fn csv_error(err: csv::Error) -> CryptotaError {
    CryptotaError::Io(std::io::Error::from(err))
}

fn timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

fn enrichment_header(fib_levels: usize) -> Vec<String> {
    let mut header: Vec<String> = ["timestamp", "open", "high", "low", "close", "volume"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(IndicatorRow::default().named().iter().map(|(name, _)| name.to_string()));
    header.extend(CandleFlags::default().named().iter().map(|(name, _)| name.to_string()));
    header.push("gap".to_string());
    header.extend(ChartFlags::default().named().iter().map(|(name, _)| name.to_string()));
    header.extend(DivergenceFlags::default().named().iter().map(|(name, _)| name.to_string()));
    header.extend(
        [
            "wave_label",
            "wave_confirmed",
            "upper_trendline",
            "lower_trendline",
            "donchian_upper",
            "donchian_lower",
            "trendline_break_up",
            "trendline_break_down",
            "channel_width_pct",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    for i in 1..=LEVEL_COUNT {
        header.push(format!("resistance_{i}"));
        header.push(format!("resistance_{i}_strength"));
    }
    for i in 1..=LEVEL_COUNT {
        header.push(format!("support_{i}"));
        header.push(format!("support_{i}_strength"));
    }
    header.push("swing_high".to_string());
    header.push("swing_low".to_string());
    header.extend((1..=fib_levels).map(|i| format!("fib_{i}")));
    header.push("round_support".to_string());
    header.push("signal".to_string());
    header
}

fn enrichment_row(e: &EnrichedBar) -> Vec<String> {
    let b = &e.bar;
    let mut row = vec![
        timestamp(b.timestamp),
        b.open.to_string(),
        b.high.to_string(),
        b.low.to_string(),
        b.close.to_string(),
        b.volume.to_string(),
    ];
    row.extend(e.indicators.named().iter().map(|(_, v)| opt(*v)));
    row.extend(e.candles.named().iter().map(|(_, v)| flag(*v)));
    row.push(e.gap.map(|g| g.to_string()).unwrap_or_default());
    row.extend(e.chart.named().iter().map(|(_, v)| flag(*v)));
    row.extend(e.divergence.named().iter().map(|(_, v)| flag(*v)));

    row.push(e.wave.wave_label.map(|l| l.to_string()).unwrap_or_default());
    row.push(flag(e.wave.wave_confirmed));
    let t = &e.trend;
    row.push(opt(t.upper_trendline));
    row.push(opt(t.lower_trendline));
    row.push(opt(t.donchian_upper));
    row.push(opt(t.donchian_lower));
    row.push(flag(t.trendline_break_up));
    row.push(flag(t.trendline_break_down));
    row.push(opt(t.channel_width_pct));

    for level in e.levels.resistance.iter().chain(e.levels.support.iter()) {
        row.push(opt(level.map(|l| l.price)));
        row.push(level.map(|l| l.strength.to_string()).unwrap_or_default());
    }

    row.push(opt(e.fib.swing_high));
    row.push(opt(e.fib.swing_low));
    row.extend(e.fib.levels.iter().map(|v| opt(*v)));
    row.push(opt(e.fib.round_support));
    row.push(e.signal.to_string());
    row
}

pub fn write_enrichment_csv<W: Write>(writer: W, enrichment: &Enrichment) -> Result<(), CryptotaError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let fib_levels = enrichment.bars.first().map_or(0, |e| e.fib.levels.len());
    wtr.write_record(enrichment_header(fib_levels)).map_err(csv_error)?;
    for bar in &enrichment.bars {
        wtr.write_record(enrichment_row(bar)).map_err(csv_error)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_equity_csv<W: Write>(writer: W, curve: &[EquityPoint]) -> Result<(), CryptotaError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["timestamp", "equity", "position_value"])
        .map_err(csv_error)?;
    for point in curve {
        wtr.write_record([
            timestamp(point.timestamp),
            point.equity.to_string(),
            point.position_value.to_string(),
        ])
        .map_err(csv_error)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_trades_csv<W: Write>(writer: W, trades: &[Trade]) -> Result<(), CryptotaError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "open_time",
        "exit_time",
        "entry_price",
        "exit_price",
        "stop_loss",
        "take_profit",
        "size",
        "exit_type",
        "pnl",
        "return_pct",
    ])
    .map_err(csv_error)?;
    for t in trades {
        wtr.write_record([
            timestamp(t.open_time),
            timestamp(t.exit_time),
            t.entry_price.to_string(),
            t.exit_price.to_string(),
            t.stop_loss.to_string(),
            t.take_profit.to_string(),
            t.size.to_string(),
            t.exit_type.to_string(),
            t.pnl.to_string(),
            t.return_pct.to_string(),
        ])
        .map_err(csv_error)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn format_summary(report: &PerformanceReport) -> String {
    let mut out = String::new();
    out.push_str("=== Backtest Results ===\n");
    out.push_str(&format!("Final Equity:     {:.2}\n", report.final_equity));
    out.push_str(&format!("Total Return:     {:.2}%\n", report.total_return * 100.0));
    out.push_str(&format!("Annual Return:    {:.2}%\n", report.annual_return * 100.0));
    out.push_str(&format!("Max Drawdown:     {:.2}%\n", report.max_drawdown * 100.0));
    out.push_str(&format!("Total Trades:     {}\n", report.num_trades));
    out.push_str(&format!("Win Rate:         {:.1}%\n", report.win_rate * 100.0));
    out.push_str(&format!("Avg R-Multiple:   {:.2}\n", report.avg_r_multiple));
    out.push_str(&format!("Profit Factor:    {:.2}\n", report.profit_factor));
    out
}
