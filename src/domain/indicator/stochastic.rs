//! Stochastic oscillator.
//!
//! %K = 100 × (C − LL) / (HH − LL) over `period` bars, %D = SMA(smooth_k) of %K.
//! A flat window substitutes [`EPSILON`] for the range.

use crate::domain::indicator::{EPSILON, rolling_max, rolling_mean_optional, rolling_min};
use crate::domain::ohlcv::{OhlcvBar, highs, lows};

pub fn stochastic_columns(
    bars: &[OhlcvBar],
    period: usize,
    smooth_k: usize,
) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let hh = rolling_max(&highs(bars), period);
    let ll = rolling_min(&lows(bars), period);
    let k: Vec<Option<f64>> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let (h, l) = (hh[i]?, ll[i]?);
            Some(100.0 * (bar.close - l) / (h - l).max(EPSILON))
        })
        .collect();
    let d = rolling_mean_optional(&k, smooth_k);
    (k, d)
}
