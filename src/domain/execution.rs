//! Risk-based position sizing and fill simulation.
//!
//! Entries size the position so that a stop-out loses a fixed fraction of
//! equity. Stops sit a multiple of ATR below the entry and the target sits
//! `take_profit_rr` risk units above it. Fills happen at the trigger level.

use chrono::NaiveDateTime;

use super::error::CryptotaError;
use super::portfolio::Portfolio;
use super::position::{ExitType, Position};

/// Stop distance used when ATR is unavailable or disabled.
pub const FALLBACK_STOP_PCT: f64 = 0.02;

#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    /// Fraction of equity risked per trade.
    pub max_risk_per_trade: f64,
    pub stop_loss_atr_multiplier: f64,
    pub take_profit_rr: f64,
    pub use_atr_stop: bool,
    pub initial_capital: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            max_risk_per_trade: 0.02,
            stop_loss_atr_multiplier: 2.0,
            take_profit_rr: 2.0,
            use_atr_stop: true,
            initial_capital: 100_000.0,
        }
    }
}

/// Stop, target and size for a prospective entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sizing {
    pub stop_loss: f64,
    pub take_profit: f64,
    pub size: f64,
}

/// Computes the bracket and size for a long entry at `entry`.
///
/// The volatility unit is `atr` when available and enabled, otherwise 2% of
/// the entry price. Fails with `InvalidRiskParameter` when the per-unit risk
/// is not positive.
pub fn size_position(
    equity: f64,
    entry: f64,
    atr: Option<f64>,
    config: &RiskConfig,
) -> Result<Sizing, CryptotaError> {
    let unit = match atr {
        Some(a) if config.use_atr_stop => a,
        _ => entry * FALLBACK_STOP_PCT,
    };
    let stop_loss = entry - config.stop_loss_atr_multiplier * unit;
    let risk_per_unit = entry - stop_loss;
    if risk_per_unit.is_nan() || risk_per_unit <= 0.0 {
        return Err(CryptotaError::InvalidRiskParameter {
            entry,
            stop: stop_loss,
        });
    }
    Ok(Sizing {
        stop_loss,
        take_profit: entry + config.take_profit_rr * risk_per_unit,
        size: equity * config.max_risk_per_trade / risk_per_unit,
    })
}

/// Opens a long position at `close` if sizing succeeds.
pub fn enter_long(
    portfolio: &mut Portfolio,
    close: f64,
    atr: Option<f64>,
    time: NaiveDateTime,
    config: &RiskConfig,
) -> Result<(), CryptotaError> {
    let sizing = size_position(portfolio.equity, close, atr, config)?;
    tracing::debug!(
        entry = close,
        stop = sizing.stop_loss,
        target = sizing.take_profit,
        size = sizing.size,
        "opening long"
    );
    portfolio.open(Position {
        entry_price: close,
        stop_loss: sizing.stop_loss,
        take_profit: sizing.take_profit,
        size: sizing.size,
        open_time: time,
    });
    Ok(())
}

/// Closes the open position if the close crossed its stop or target.
/// The stop is checked first. Returns the exit type taken.
pub fn check_brackets(portfolio: &mut Portfolio, close: f64, time: NaiveDateTime) -> Option<ExitType> {
    let pos = portfolio.position.as_ref()?;
    let (exit_type, exit_price) = if pos.should_stop_loss(close) {
        (ExitType::StopLoss, pos.stop_loss)
    } else if pos.should_take_profit(close) {
        (ExitType::TakeProfit, pos.take_profit)
    } else {
        return None;
    };
    close_position(portfolio, exit_type, exit_price, time);
    Some(exit_type)
}

/// Closes the open position at `price`, if any.
pub fn close_position(portfolio: &mut Portfolio, exit_type: ExitType, price: f64, time: NaiveDateTime) {
    if let Some(pos) = portfolio.position.take() {
        let trade = pos.close(exit_type, price, time);
        tracing::debug!(exit = %exit_type, price, pnl = trade.pnl, "closing long");
        portfolio.record_trade(trade);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testkit::ts;
    use approx::assert_relative_eq;

    #[test]
    fn sizing_from_atr() {
        let s = size_position(100_000.0, 100.0, Some(5.0), &RiskConfig::default()).unwrap();
        assert_relative_eq!(s.stop_loss, 90.0);
        assert_relative_eq!(s.take_profit, 120.0);
        assert_relative_eq!(s.size, 200.0);
    }

    #[test]
    fn sizing_falls_back_without_atr() {
        let s = size_position(10_000.0, 50.0, None, &RiskConfig::default()).unwrap();
        // unit = 1.0, stop two units below
        assert_relative_eq!(s.stop_loss, 48.0);
        assert_relative_eq!(s.take_profit, 54.0);
        assert_relative_eq!(s.size, 100.0);

        let no_atr = RiskConfig {
            use_atr_stop: false,
            ..RiskConfig::default()
        };
        let s = size_position(10_000.0, 50.0, Some(10.0), &no_atr).unwrap();
        assert_relative_eq!(s.stop_loss, 48.0);
    }

    #[test]
    fn zero_atr_is_invalid() {
        let err = size_position(10_000.0, 50.0, Some(0.0), &RiskConfig::default()).unwrap_err();
        assert!(matches!(err, CryptotaError::InvalidRiskParameter { entry, stop } if entry == 50.0 && stop == 50.0));
    }

    #[test]
    fn stop_fills_at_stop_level() {
        let mut portfolio = Portfolio::new(100_000.0);
        enter_long(&mut portfolio, 100.0, Some(5.0), ts(0), &RiskConfig::default()).unwrap();
        assert_eq!(check_brackets(&mut portfolio, 95.0, ts(1)), None);
        assert_eq!(check_brackets(&mut portfolio, 85.0, ts(2)), Some(ExitType::StopLoss));
        let trade = &portfolio.closed_trades[0];
        assert_relative_eq!(trade.exit_price, 90.0);
        assert_relative_eq!(trade.pnl, -2_000.0);
        assert_relative_eq!(portfolio.equity, 98_000.0);
        assert!(portfolio.is_flat());
    }

    #[test]
    fn target_fills_at_target_level() {
        let mut portfolio = Portfolio::new(100_000.0);
        enter_long(&mut portfolio, 100.0, Some(5.0), ts(0), &RiskConfig::default()).unwrap();
        assert_eq!(check_brackets(&mut portfolio, 125.0, ts(1)), Some(ExitType::TakeProfit));
        assert_relative_eq!(portfolio.closed_trades[0].pnl, 4_000.0);
    }

    #[test]
    fn close_position_when_flat_is_noop() {
        let mut portfolio = Portfolio::new(1_000.0);
        close_position(&mut portfolio, ExitType::SignalClose, 10.0, ts(0));
        assert!(portfolio.closed_trades.is_empty());
    }
}
