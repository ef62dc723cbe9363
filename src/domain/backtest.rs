//! Long-only backtest loop over enriched bars.
//!
//! Per bar: bracket exits first, then a sell-signal exit, then a buy-signal
//! entry when flat, then an equity snapshot. Sell signals never open shorts.

use super::error::CryptotaError;
use super::execution::{RiskConfig, check_brackets, close_position, enter_long};
use super::fusion::Signal;
use super::metrics::PerformanceReport;
use super::pipeline::EnrichedBar;
use super::portfolio::Portfolio;
use super::position::ExitType;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestOutcome {
    pub report: PerformanceReport,
    pub portfolio: Portfolio,
}

pub fn run_backtest(bars: &[EnrichedBar], config: &RiskConfig) -> BacktestOutcome {
    let mut portfolio = Portfolio::new(config.initial_capital);
    let mut skipped = 0usize;

    for enriched in bars {
        let bar = &enriched.bar;
        check_brackets(&mut portfolio, bar.close, bar.timestamp);

        if !portfolio.is_flat() && enriched.signal == Signal::Sell {
            close_position(&mut portfolio, ExitType::SignalClose, bar.close, bar.timestamp);
        }

        if portfolio.is_flat() && enriched.signal == Signal::Buy {
            match enter_long(&mut portfolio, bar.close, enriched.indicators.atr, bar.timestamp, config) {
                Ok(()) => {}
                Err(err @ CryptotaError::InvalidRiskParameter { .. }) => {
                    skipped += 1;
                    tracing::warn!(timestamp = %bar.timestamp, error = %err, "entry skipped");
                }
                Err(err) => tracing::warn!(error = %err, "entry failed"),
            }
        }

        portfolio.record_equity(bar.timestamp, bar.close);
    }

    let report = PerformanceReport::compute(&portfolio, config.max_risk_per_trade);
    tracing::info!(
        trades = report.num_trades,
        skipped,
        final_equity = report.final_equity,
        "backtest complete"
    );
    BacktestOutcome { report, portfolio }
}
