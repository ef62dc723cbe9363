//! Price gap detection and classification.

use crate::domain::indicator::{IndicatorRow, rolling_max, rolling_min};
use crate::domain::ohlcv::{OhlcvBar, highs, lows};
use crate::domain::patterns::volume_spikes;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct GapConfig {
    pub enabled: bool,
    /// Open must clear the prior high/low by this fraction.
    pub min_gap_pct: f64,
    pub volume_multiplier: f64,
    /// Window for the "near recent extreme" exhaustion test.
    pub trend_period: usize,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_gap_pct: 0.005,
            volume_multiplier: 1.5,
            trend_period: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapClass {
    Common,
    Breakaway,
    Continuation,
    Exhaustion,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gap {
    pub direction: GapDirection,
    pub class: GapClass,
    /// |open − prev close| / prev close
    pub size_pct: f64,
}

impl Gap {
    /// Breakaway or continuation gaps in the given direction.
    pub fn is_breakout(&self, direction: GapDirection) -> bool {
        self.direction == direction
            && matches!(self.class, GapClass::Breakaway | GapClass::Continuation)
    }
}

impl fmt::Display for Gap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = match self.class {
            GapClass::Common => "common",
            GapClass::Breakaway => "breakaway",
            GapClass::Continuation => "continuation",
            GapClass::Exhaustion => "exhaustion",
        };
        let dir = match self.direction {
            GapDirection::Up => "up",
            GapDirection::Down => "down",
        };
        write!(f, "{class}_{dir}")
    }
}

/// Classifies the opening gap of every bar.
///
/// Gaps without a volume spike, or against the trend given by close versus
/// `ema_medium`, are common. A trending spike gap next to the
/// `trend_period` extreme is an exhaustion gap; otherwise it is a
/// continuation when the prior bar was already trending and a breakaway
/// when it was not.
pub fn detect_gaps(bars: &[OhlcvBar], indicators: &[IndicatorRow], cfg: &GapConfig) -> Vec<Option<Gap>> {
    let mut out = vec![None; bars.len()];
    if !cfg.enabled {
        return out;
    }

    let spikes = volume_spikes(bars, 20, cfg.volume_multiplier);
    let recent_high = rolling_max(&highs(bars), cfg.trend_period);
    let recent_low = rolling_min(&lows(bars), cfg.trend_period);
    let up_trend = |i: usize| indicators[i].ema_medium.is_some_and(|e| bars[i].close > e);
    let down_trend = |i: usize| indicators[i].ema_medium.is_some_and(|e| bars[i].close < e);

    for i in 1..bars.len() {
        let (prev, cur) = (&bars[i - 1], &bars[i]);
        let direction = if cur.open > prev.high * (1.0 + cfg.min_gap_pct) {
            GapDirection::Up
        } else if cur.open < prev.low * (1.0 - cfg.min_gap_pct) {
            GapDirection::Down
        } else {
            continue;
        };

        let (trending, was_trending, near_extreme) = match direction {
            GapDirection::Up => (
                up_trend(i),
                up_trend(i - 1),
                recent_high[i].is_some_and(|h| cur.high >= h * 0.99),
            ),
            GapDirection::Down => (
                down_trend(i),
                down_trend(i - 1),
                recent_low[i].is_some_and(|l| cur.low <= l * 1.01),
            ),
        };

        let class = if !spikes[i] || !trending {
            GapClass::Common
        } else if near_extreme {
            GapClass::Exhaustion
        } else if was_trending {
            GapClass::Continuation
        } else {
            GapClass::Breakaway
        };

        let size_pct = if prev.close != 0.0 {
            (cur.open - prev.close).abs() / prev.close
        } else {
            0.0
        };
        out[i] = Some(Gap {
            direction,
            class,
            size_pct,
        });
    }

    let count = out.iter().flatten().count();
    tracing::debug!(gaps = count, "gap detection complete");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testkit::bar;

    fn quiet_bars(n: usize) -> Vec<OhlcvBar> {
        (0..n).map(|i| bar(i, 100.0, 101.0, 99.0, 100.0, 1000.0)).collect()
    }

    fn rows_with_ema(n: usize, ema: f64) -> Vec<IndicatorRow> {
        (0..n)
            .map(|_| IndicatorRow {
                ema_medium: Some(ema),
                ..IndicatorRow::default()
            })
            .collect()
    }

    #[test]
    fn small_open_move_is_not_a_gap() {
        let mut bars = quiet_bars(30);
        bars[29] = bar(29, 101.2, 102.0, 100.5, 101.5, 1000.0);
        let gaps = detect_gaps(&bars, &rows_with_ema(30, 90.0), &GapConfig::default());
        assert!(gaps.iter().all(Option::is_none));
    }

    #[test]
    fn gap_without_volume_is_common() {
        let mut bars = quiet_bars(30);
        bars[29] = bar(29, 105.0, 106.0, 104.5, 105.5, 1000.0);
        let gaps = detect_gaps(&bars, &rows_with_ema(30, 90.0), &GapConfig::default());
        let gap = gaps[29].unwrap();
        assert_eq!(gap.direction, GapDirection::Up);
        assert_eq!(gap.class, GapClass::Common);
        assert!((gap.size_pct - 0.05).abs() < 1e-12);
        assert_eq!(gap.to_string(), "common_up");
    }

    #[test]
    fn spike_gap_near_high_is_exhaustion() {
        let mut bars = quiet_bars(30);
        bars[29] = bar(29, 105.0, 106.0, 104.5, 105.5, 10_000.0);
        let cfg = GapConfig {
            trend_period: 20,
            ..GapConfig::default()
        };
        let gaps = detect_gaps(&bars, &rows_with_ema(30, 90.0), &cfg);
        assert_eq!(gaps[29].unwrap().class, GapClass::Exhaustion);
    }

    #[test]
    fn spike_gap_continuation_vs_breakaway() {
        let mut bars = quiet_bars(30);
        bars[29] = bar(29, 105.0, 106.0, 104.5, 105.5, 10_000.0);
        // trend window too long to be near an extreme
        let cfg = GapConfig {
            trend_period: 100,
            ..GapConfig::default()
        };

        let trending = rows_with_ema(30, 90.0);
        assert_eq!(detect_gaps(&bars, &trending, &cfg)[29].unwrap().class, GapClass::Continuation);

        let mut fresh = rows_with_ema(30, 102.0);
        fresh[29].ema_medium = Some(95.0);
        let gap = detect_gaps(&bars, &fresh, &cfg)[29].unwrap();
        assert_eq!(gap.class, GapClass::Breakaway);
        assert!(gap.is_breakout(GapDirection::Up));
    }

    #[test]
    fn down_gap_detected() {
        let mut bars = quiet_bars(30);
        bars[29] = bar(29, 95.0, 95.5, 94.0, 94.5, 1000.0);
        let gaps = detect_gaps(&bars, &rows_with_ema(30, 90.0), &GapConfig::default());
        assert_eq!(gaps[29].unwrap().direction, GapDirection::Down);
    }

    #[test]
    fn disabled_yields_nothing() {
        let mut bars = quiet_bars(30);
        bars[29] = bar(29, 105.0, 106.0, 104.5, 105.5, 10_000.0);
        let cfg = GapConfig {
            enabled: false,
            ..GapConfig::default()
        };
        assert!(detect_gaps(&bars, &rows_with_ema(30, 90.0), &cfg).iter().all(Option::is_none));
    }
}
