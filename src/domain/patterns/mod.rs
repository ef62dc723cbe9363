//! Price pattern detectors: candlesticks, gaps, chart formations, waves and trendlines.

pub mod candlestick;
pub mod chart;
pub mod gaps;
pub mod trendline;
pub mod wave;

use crate::domain::indicator::sma_values;
use crate::domain::ohlcv::{OhlcvBar, volumes};

/// Bars whose volume exceeds `multiplier` × the trailing `period`-bar mean
/// (current bar included). False while the mean is still warming up.
pub fn volume_spikes(bars: &[OhlcvBar], period: usize, multiplier: f64) -> Vec<bool> {
    let vols = volumes(bars);
    let mean = sma_values(&vols, period);
    vols.iter()
        .zip(mean)
        .map(|(v, m)| m.is_some_and(|m| *v > m * multiplier))
        .collect()
}

/// A boolean that stays set for the rest of the series once raised.
///
/// Used for confirmation and divergence flags: there is no reset within a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latch {
    set_at: Option<usize>,
}

impl Latch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the latch at bar `index`. The earliest index wins.
    pub fn set(&mut self, index: usize) {
        self.set_at = Some(self.set_at.map_or(index, |s| s.min(index)));
    }

    pub fn set_at(&self) -> Option<usize> {
        self.set_at
    }

    pub fn is_set(&self) -> bool {
        self.set_at.is_some()
    }

    /// Expands the latch into a per-bar series of length `len`.
    pub fn series(&self, len: usize) -> Vec<bool> {
        (0..len).map(|i| self.set_at.is_some_and(|s| i >= s)).collect()
    }
}
