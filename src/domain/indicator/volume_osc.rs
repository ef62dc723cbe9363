//! Volume oscillator: (EMA_short(V) − EMA_long(V)) / EMA_long(V) × 100.

use crate::domain::indicator::ema_values;
use crate::domain::ohlcv::{OhlcvBar, volumes};

pub fn volume_osc_values(bars: &[OhlcvBar], short: usize, long: usize) -> Vec<Option<f64>> {
    let vols = volumes(bars);
    let fast = ema_values(&vols, short);
    let slow = ema_values(&vols, long);
    fast.iter()
        .zip(&slow)
        .map(|(f, s)| match (*f, *s) {
            (Some(f), Some(s)) if s != 0.0 => Some((f - s) / s * 100.0),
            _ => None,
        })
        .collect()
}
