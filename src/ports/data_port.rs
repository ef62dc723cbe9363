//! Market data port.

use crate::domain::error::CryptotaError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::resample::Timeframe;

pub trait MarketDataPort {
    /// Bars for `symbol` at `timeframe`, oldest first. `limit` keeps only the
    /// most recent bars.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: Option<usize>,
    ) -> Result<Vec<OhlcvBar>, CryptotaError>;
}
