//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line, seeded once the line exists
//! Histogram = MACD Line - Signal Line
//!
//! Warmup: the line is defined from bar slow-1, the signal from slow-1+signal-1.

use crate::domain::indicator::{ema_of_optional, ema_values};

/// Line, signal and histogram columns over raw values.
pub struct MacdColumns {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

pub fn macd_columns(values: &[f64], fast: usize, slow: usize, signal: usize) -> MacdColumns {
    let ema_fast = ema_values(values, fast);
    let ema_slow = ema_values(values, slow);
    let line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let signal_line = ema_of_optional(&line, signal);
    let histogram = line
        .iter()
        .zip(&signal_line)
        .map(|(l, s)| Some((*l)? - (*s)?))
        .collect();

    MacdColumns {
        line,
        signal: signal_line,
        histogram,
    }
}
