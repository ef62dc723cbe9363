//! Price/oscillator divergence on RSI, MACD histogram and OBV.
//!
//! At every bar the last two swing lows (or highs) known at that bar and
//! lying inside the trailing `lookback` window are compared with the
//! oscillator values at the same bars. A hit latches the flag for the rest
//! of the series.

use crate::domain::indicator::IndicatorRow;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::patterns::Latch;
use crate::domain::swing::{SwingPoint, known_at, swing_highs, swing_lows};

#[derive(Debug, Clone, PartialEq)]
pub struct DivergenceConfig {
    pub enabled: bool,
    pub lookback: usize,
    pub extrema_order: usize,
    pub price_tolerance: f64,
    /// Relative oscillator move required (`obv_tolerance` for OBV).
    pub indicator_tolerance: f64,
}

impl Default for DivergenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lookback: 50,
            extrema_order: 10,
            price_tolerance: 0.01,
            indicator_tolerance: 0.02,
        }
    }
}

impl DivergenceConfig {
    /// Defaults for the OBV detector, which looks further back.
    pub fn obv_default() -> Self {
        Self {
            lookback: 60,
            extrema_order: 12,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DivergenceFlags {
    pub rsi_bullish_div: bool,
    pub rsi_bearish_div: bool,
    pub macd_bullish_div: bool,
    pub macd_bearish_div: bool,
    pub obv_bullish_div: bool,
    pub obv_bearish_div: bool,
}

impl DivergenceFlags {
    pub fn any_bullish(&self) -> bool {
        self.rsi_bullish_div || self.macd_bullish_div || self.obv_bullish_div
    }

    pub fn any_bearish(&self) -> bool {
        self.rsi_bearish_div || self.macd_bearish_div || self.obv_bearish_div
    }

    pub fn named(&self) -> [(&'static str, bool); 6] {
        [
            ("rsi_bullish_div", self.rsi_bullish_div),
            ("rsi_bearish_div", self.rsi_bearish_div),
            ("macd_bullish_div", self.macd_bullish_div),
            ("macd_bearish_div", self.macd_bearish_div),
            ("obv_bullish_div", self.obv_bullish_div),
            ("obv_bearish_div", self.obv_bearish_div),
        ]
    }
}

/// Latched bullish and bearish divergence series for one oscillator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivergenceSeries {
    pub bullish: Vec<bool>,
    pub bearish: Vec<bool>,
}

fn last_two_in_window(points: &[SwingPoint], t: usize, lookback: usize) -> Option<(SwingPoint, SwingPoint)> {
    let start = (t + 1).saturating_sub(lookback);
    match known_at(points, t) {
        [.., a, b] if a.index >= start => Some((*a, *b)),
        _ => None,
    }
}

/// Price makes a lower low while the oscillator makes a higher one.
fn bullish_at(pair: (SwingPoint, SwingPoint), osc: &[Option<f64>], cfg: &DivergenceConfig) -> bool {
    let (p1, p2) = pair;
    let (Some(o1), Some(o2)) = (value_at(osc, p1.index), value_at(osc, p2.index)) else {
        return false;
    };
    p2.price < p1.price * (1.0 - cfg.price_tolerance) && o2 > o1 + o1.abs() * cfg.indicator_tolerance
}

fn bearish_at(pair: (SwingPoint, SwingPoint), osc: &[Option<f64>], cfg: &DivergenceConfig) -> bool {
    let (p1, p2) = pair;
    let (Some(o1), Some(o2)) = (value_at(osc, p1.index), value_at(osc, p2.index)) else {
        return false;
    };
    p2.price > p1.price * (1.0 + cfg.price_tolerance) && o2 < o1 - o1.abs() * cfg.indicator_tolerance
}

fn value_at(osc: &[Option<f64>], index: usize) -> Option<f64> {
    osc.get(index).copied().flatten()
}

pub fn detect_divergence(bars: &[OhlcvBar], oscillator: &[Option<f64>], cfg: &DivergenceConfig) -> DivergenceSeries {
    let n = bars.len();
    let mut bull = Latch::new();
    let mut bear = Latch::new();
    if cfg.enabled {
        let lows = swing_lows(bars, cfg.extrema_order);
        let highs = swing_highs(bars, cfg.extrema_order);

        for t in 0..n {
            if !bull.is_set()
                && last_two_in_window(&lows, t, cfg.lookback).is_some_and(|pair| bullish_at(pair, oscillator, cfg))
            {
                bull.set(t);
            }
            if !bear.is_set()
                && last_two_in_window(&highs, t, cfg.lookback).is_some_and(|pair| bearish_at(pair, oscillator, cfg))
            {
                bear.set(t);
            }
        }
    }
    DivergenceSeries {
        bullish: bull.series(n),
        bearish: bear.series(n),
    }
}

pub fn detect_divergences(
    bars: &[OhlcvBar],
    indicators: &[IndicatorRow],
    cfg: &DivergenceConfig,
    obv_cfg: &DivergenceConfig,
) -> Vec<DivergenceFlags> {
    let column = |f: fn(&IndicatorRow) -> Option<f64>| indicators.iter().map(f).collect::<Vec<_>>();
    let rsi = detect_divergence(bars, &column(|r| r.rsi), cfg);
    let macd = detect_divergence(bars, &column(|r| r.macd_hist), cfg);
    let obv = detect_divergence(bars, &column(|r| r.obv), obv_cfg);

    let flags: Vec<DivergenceFlags> = (0..bars.len())
        .map(|i| DivergenceFlags {
            rsi_bullish_div: rsi.bullish[i],
            rsi_bearish_div: rsi.bearish[i],
            macd_bullish_div: macd.bullish[i],
            macd_bearish_div: macd.bearish[i],
            obv_bullish_div: obv.bullish[i],
            obv_bearish_div: obv.bearish[i],
        })
        .collect();
    if let Some(last) = flags.last() {
        tracing::debug!(bullish = last.any_bullish(), bearish = last.any_bearish(), "divergence scan complete");
    }
    flags
}
