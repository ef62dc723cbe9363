//! Brokerage port. Contract only; no live implementation ships.

use std::fmt;

use crate::domain::error::CryptotaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    Limit,
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSide {
    Long,
    Short,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Balance {
    pub total: f64,
    pub free: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrokerPosition {
    pub symbol: String,
    pub side: PositionSide,
    /// Contracts or coins held; zero for a closed slot.
    pub contracts: f64,
    pub unrealized_pnl: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderAck {
    pub id: String,
}

/// Order routing for a live venue. No implementation ships with the crate and
/// neither the CLI nor the simulator calls it; the backtest never routes orders.
pub trait BrokeragePort {
    fn get_balance(&self) -> Result<Balance, CryptotaError>;

    /// Open positions, optionally restricted to one symbol.
    fn get_positions(&self, symbol: Option<&str>) -> Result<Vec<BrokerPosition>, CryptotaError>;

    /// `price` is ignored for market orders.
    fn place_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: f64,
        price: Option<f64>,
        order_type: OrderType,
    ) -> Result<OrderAck, CryptotaError>;

    /// Flattens every open position in `symbol` with opposing market orders.
    fn close_position(&self, symbol: &str) -> Result<Vec<OrderAck>, CryptotaError> {
        let mut acks = Vec::new();
        for pos in self.get_positions(Some(symbol))? {
            if pos.contracts == 0.0 {
                continue;
            }
            let side = match pos.side {
                PositionSide::Long => OrderSide::Sell,
                PositionSide::Short => OrderSide::Buy,
            };
            tracing::info!(symbol, %side, amount = pos.contracts.abs(), "closing position");
            acks.push(self.place_order(symbol, side, pos.contracts.abs(), None, OrderType::Market)?);
        }
        Ok(acks)
    }
}
