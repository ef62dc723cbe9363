//! Performance summary over a finished backtest.

use super::portfolio::{EquityPoint, Portfolio};

const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub total_return: f64,
    pub annual_return: f64,
    /// Most negative equity / running peak − 1; zero or below.
    pub max_drawdown: f64,
    pub win_rate: f64,
    /// Mean trade return divided by the risk fraction.
    pub avg_r_multiple: f64,
    /// Gross profit / |gross loss|. Zero without trades, infinite with
    /// winners and no losers.
    pub profit_factor: f64,
    pub num_trades: usize,
    pub final_equity: f64,
}

impl PerformanceReport {
    pub fn compute(portfolio: &Portfolio, risk_pct: f64) -> Self {
        let equity_curve = &portfolio.equity_curve;
        let trades = &portfolio.closed_trades;
        let initial_capital = portfolio.initial_capital;
        let final_equity = portfolio.equity;

        let total_return = if initial_capital > 0.0 {
            final_equity / initial_capital - 1.0
        } else {
            0.0
        };

        let days = elapsed_days(equity_curve);
        let annual_return = if days > 0 && total_return > -1.0 {
            (1.0 + total_return).powf(DAYS_PER_YEAR / days as f64) - 1.0
        } else {
            0.0
        };

        let num_trades = trades.len();
        let (win_rate, avg_r_multiple) = if num_trades > 0 {
            let wins = trades.iter().filter(|t| t.pnl > 0.0).count();
            let mean_return = trades.iter().map(|t| t.return_pct).sum::<f64>() / num_trades as f64;
            let r = if risk_pct > 0.0 { mean_return / risk_pct } else { 0.0 };
            (wins as f64 / num_trades as f64, r)
        } else {
            (0.0, 0.0)
        };

        let gross_profit: f64 = trades.iter().map(|t| t.pnl).filter(|p| *p > 0.0).sum();
        let gross_loss: f64 = trades.iter().map(|t| t.pnl).filter(|p| *p < 0.0).sum::<f64>().abs();
        let profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        PerformanceReport {
            total_return,
            annual_return,
            max_drawdown: max_drawdown(equity_curve),
            win_rate,
            avg_r_multiple,
            profit_factor,
            num_trades,
            final_equity,
        }
    }
}

/// Whole days from the first to the last point, plus one.
fn elapsed_days(equity_curve: &[EquityPoint]) -> i64 {
    match (equity_curve.first(), equity_curve.last()) {
        (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_days() + 1,
        _ => 0,
    }
}

pub fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for point in equity_curve {
        peak = peak.max(point.equity);
        if peak > 0.0 {
            worst = worst.min(point.equity / peak - 1.0);
        }
    }
    worst
}
