//! Bar builders shared by unit tests.

use crate::domain::ohlcv::OhlcvBar;
use chrono::{NaiveDate, NaiveDateTime};

pub fn ts(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::hours(i as i64)
}

pub fn bar(i: usize, open: f64, high: f64, low: f64, close: f64, volume: f64) -> OhlcvBar {
    OhlcvBar::new(ts(i), open, high, low, close, volume)
}

/// Bars with open = high = low = close.
pub fn flat_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| bar(i, c, c, c, c, 1000.0))
        .collect()
}

/// Bars from (open, high, low, close) tuples, volume 1000.
pub fn ohlc_bars(rows: &[(f64, f64, f64, f64)]) -> Vec<OhlcvBar> {
    rows.iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| bar(i, o, h, l, c, 1000.0))
        .collect()
}
