//! Bollinger Bands indicator.
//!
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is the population standard deviation (divides by N, not N-1).
//! Warmup: first (period-1) bars are undefined.

use crate::domain::indicator::stddev::rolling_mean_std;
use crate::domain::ohlcv::{OhlcvBar, closes};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    /// Band width as a percentage of the middle band; undefined for a zero middle.
    pub fn width_pct(&self) -> Option<f64> {
        if self.middle == 0.0 {
            return None;
        }
        Some((self.upper - self.lower) / self.middle * 100.0)
    }
}

pub fn bollinger_values(bars: &[OhlcvBar], period: usize, std_dev: f64) -> Vec<Option<BollingerBands>> {
    rolling_mean_std(&closes(bars), period)
        .into_iter()
        .map(|stats| {
            stats.map(|(middle, sd)| BollingerBands {
                upper: middle + std_dev * sd,
                middle,
                lower: middle - std_dev * sd,
            })
        })
        .collect()
}
