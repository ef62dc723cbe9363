//! Open long position and completed trade records.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Units held; fractional sizes are allowed.
    pub size: f64,
    pub open_time: NaiveDateTime,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.size * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.size * (price - self.entry_price)
    }

    pub fn should_stop_loss(&self, close: f64) -> bool {
        close <= self.stop_loss
    }

    pub fn should_take_profit(&self, close: f64) -> bool {
        close >= self.take_profit
    }

    /// Closes the position at `exit_price`.
    pub fn close(self, exit_type: ExitType, exit_price: f64, exit_time: NaiveDateTime) -> Trade {
        let return_pct = if self.entry_price != 0.0 {
            exit_price / self.entry_price - 1.0
        } else {
            0.0
        };
        Trade {
            pnl: self.unrealized_pnl(exit_price),
            entry_price: self.entry_price,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            size: self.size,
            open_time: self.open_time,
            exit_type,
            exit_price,
            exit_time,
            return_pct,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitType {
    StopLoss,
    TakeProfit,
    SignalClose,
}

impl fmt::Display for ExitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitType::StopLoss => "stop_loss",
            ExitType::TakeProfit => "take_profit",
            ExitType::SignalClose => "signal_close",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub size: f64,
    pub open_time: NaiveDateTime,
    pub exit_type: ExitType,
    pub exit_price: f64,
    pub exit_time: NaiveDateTime,
    pub pnl: f64,
    /// exit / entry − 1
    pub return_pct: f64,
}
