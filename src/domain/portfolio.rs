//! Single-instrument account state: cash equity, the open position, the
//! trade ledger and the equity curve.

use chrono::NaiveDateTime;

use super::position::{Position, Trade};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    /// Initial capital plus realized PnL.
    pub equity: f64,
    /// Mark-to-market value of the open position.
    pub position_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub equity: f64,
    pub initial_capital: f64,
    pub position: Option<Position>,
    pub closed_trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            equity: initial_capital,
            initial_capital,
            position: None,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn open(&mut self, position: Position) {
        self.position = Some(position);
    }

    /// Realizes the open trade and appends it to the ledger.
    pub fn record_trade(&mut self, trade: Trade) {
        self.equity += trade.pnl;
        self.closed_trades.push(trade);
    }

    pub fn record_equity(&mut self, timestamp: NaiveDateTime, close: f64) {
        let position_value = self.position.as_ref().map_or(0.0, |p| p.market_value(close));
        self.equity_curve.push(EquityPoint {
            timestamp,
            equity: self.equity,
            position_value,
        });
    }
}
