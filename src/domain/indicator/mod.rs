//! Technical indicators as per-bar columns.
//!
//! Every kernel returns one slot per input bar. Warm-up bars carry `None`,
//! so consumers never see a placeholder zero.

pub mod atr;
pub mod bollinger;
pub mod cmf;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod rsi;
pub mod set;
pub mod sma;
pub mod stddev;
pub mod stochastic;
pub mod volume_osc;
pub mod vwap;

pub use ema::{ema_of_optional, ema_values};
pub use set::{IndicatorConfig, IndicatorRow, compute_indicators};
pub use sma::sma_values;

/// Substituted for zero denominators (flat ranges, zero volume).
pub const EPSILON: f64 = 1e-10;

/// Trailing window maximum including the current element.
pub fn rolling_max(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_fold(values, period, f64::NEG_INFINITY, f64::max)
}

/// Trailing window minimum including the current element.
pub fn rolling_min(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_fold(values, period, f64::INFINITY, f64::min)
}

fn rolling_fold(
    values: &[f64],
    period: usize,
    init: f64,
    f: impl Fn(f64, f64) -> f64,
) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    for i in (period - 1)..values.len() {
        out[i] = Some(values[i + 1 - period..=i].iter().copied().fold(init, &f));
    }
    out
}

/// Trailing mean of an optional series over `period` slots; undefined while
/// any slot in the window is undefined.
pub fn rolling_mean_optional(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    for i in (period.saturating_sub(1))..values.len() {
        let window = &values[i + 1 - period..=i];
        let sum: Option<f64> = window.iter().copied().sum();
        out[i] = sum.map(|s| s / period as f64);
    }
    out
}
