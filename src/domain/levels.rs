//! Support/resistance levels and Fibonacci retracements.

use crate::domain::indicator::{rolling_max, rolling_min};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::swing::{SwingPoint, known_at, swing_highs, swing_lows};

pub const LEVEL_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct SupportResistanceConfig {
    pub extrema_order: usize,
    /// Band half-width around a level, as a fraction of the level.
    pub touch_tolerance_pct: f64,
}

impl Default for SupportResistanceConfig {
    fn default() -> Self {
        Self {
            extrema_order: 20,
            touch_tolerance_pct: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    pub price: f64,
    /// Closes so far within the tolerance band.
    pub strength: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LevelState {
    /// Highest known swing highs, strongest first.
    pub resistance: [Option<Level>; LEVEL_COUNT],
    /// Lowest known swing lows, lowest first.
    pub support: [Option<Level>; LEVEL_COUNT],
}

fn ranked(points: &[SwingPoint], highest: bool) -> [Option<f64>; LEVEL_COUNT] {
    let mut prices: Vec<f64> = points.iter().map(|p| p.price).collect();
    if highest {
        prices.sort_by(|a, b| b.total_cmp(a));
    } else {
        prices.sort_by(|a, b| a.total_cmp(b));
    }
    let mut out = [None; LEVEL_COUNT];
    for (slot, price) in out.iter_mut().zip(prices) {
        *slot = Some(price);
    }
    out
}

fn touches(level: f64, close: f64, tolerance: f64) -> bool {
    (close - level).abs() <= level.abs() * tolerance
}

/// Keeps per-level touch counts current as bars arrive. Counts are rebuilt
/// only when the ranked price set changes.
struct LevelTracker {
    prices: [Option<f64>; LEVEL_COUNT],
    counts: [usize; LEVEL_COUNT],
}

impl LevelTracker {
    fn new() -> Self {
        Self {
            prices: [None; LEVEL_COUNT],
            counts: [0; LEVEL_COUNT],
        }
    }

    fn advance(&mut self, prices: [Option<f64>; LEVEL_COUNT], closes: &[f64], tolerance: f64) -> [Option<Level>; LEVEL_COUNT] {
        let t = closes.len() - 1;
        if prices != self.prices {
            self.prices = prices;
            for (count, price) in self.counts.iter_mut().zip(prices) {
                *count = price.map_or(0, |p| closes.iter().filter(|&&c| touches(p, c, tolerance)).count());
            }
        } else {
            for (count, price) in self.counts.iter_mut().zip(prices) {
                if price.is_some_and(|p| touches(p, closes[t], tolerance)) {
                    *count += 1;
                }
            }
        }
        let mut out = [None; LEVEL_COUNT];
        for ((slot, price), count) in out.iter_mut().zip(self.prices).zip(self.counts) {
            *slot = price.map(|price| Level { price, strength: count });
        }
        out
    }
}

pub fn track_levels(bars: &[OhlcvBar], cfg: &SupportResistanceConfig) -> Vec<LevelState> {
    let sh = swing_highs(bars, cfg.extrema_order);
    let sl = swing_lows(bars, cfg.extrema_order);
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let mut resistance = LevelTracker::new();
    let mut support = LevelTracker::new();

    (0..bars.len())
        .map(|t| LevelState {
            resistance: resistance.advance(ranked(known_at(&sh, t), true), &closes[..=t], cfg.touch_tolerance_pct),
            support: support.advance(ranked(known_at(&sl, t), false), &closes[..=t], cfg.touch_tolerance_pct),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct FibonacciConfig {
    pub swing_lookback: usize,
    pub levels: Vec<f64>,
    pub round_step: f64,
}

impl Default for FibonacciConfig {
    fn default() -> Self {
        Self {
            swing_lookback: 100,
            levels: vec![0.236, 0.382, 0.5, 0.618, 0.786],
            round_step: 5000.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FibonacciState {
    pub swing_high: Option<f64>,
    pub swing_low: Option<f64>,
    /// One price per configured ratio, in configuration order.
    pub levels: Vec<Option<f64>>,
    pub round_support: Option<f64>,
}

/// Rolling max/min that emits once `min_periods` values are in the window.
fn partial_window(values: &[f64], window: usize, min_periods: usize, max: bool) -> Vec<Option<f64>> {
    let full = if max { rolling_max(values, window) } else { rolling_min(values, window) };
    let fold = |head: &[f64]| {
        let it = head.iter().copied();
        if max { it.fold(f64::NEG_INFINITY, f64::max) } else { it.fold(f64::INFINITY, f64::min) }
    };
    (0..values.len())
        .map(|i| {
            if i + 1 < min_periods.max(1) {
                return None;
            }
            full[i].or_else(|| Some(fold(&values[..=i])))
        })
        .collect()
}

pub fn fibonacci_levels(bars: &[OhlcvBar], cfg: &FibonacciConfig) -> Vec<FibonacciState> {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let min_periods = cfg.swing_lookback / 2;
    let swing_high = partial_window(&highs, cfg.swing_lookback, min_periods, true);
    let swing_low = partial_window(&lows, cfg.swing_lookback, min_periods, false);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let levels = match (swing_high[i], swing_low[i]) {
                (Some(h), Some(l)) => {
                    let diff = if h - l > 0.0 { h - l } else { 1e-8 };
                    cfg.levels.iter().map(|ratio| Some(h - diff * ratio)).collect()
                }
                _ => vec![None; cfg.levels.len()],
            };
            FibonacciState {
                swing_high: swing_high[i],
                swing_low: swing_low[i],
                levels,
                round_support: (cfg.round_step > 0.0)
                    .then(|| (bar.close / cfg.round_step).round_ties_even() * cfg.round_step),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testkit::{bar, ohlc_bars};
    use approx::assert_relative_eq;

    fn flat(values: &[f64]) -> Vec<OhlcvBar> {
        let rows: Vec<_> = values.iter().map(|&v| (v, v, v, v)).collect();
        ohlc_bars(&rows)
    }

    fn sr_cfg() -> SupportResistanceConfig {
        SupportResistanceConfig {
            extrema_order: 1,
            touch_tolerance_pct: 0.01,
        }
    }

    #[test]
    fn levels_rank_known_extremes() {
        let bars = flat(&[10.0, 12.0, 10.0, 15.0, 10.0, 13.0, 10.0, 14.0, 10.0]);
        let states = track_levels(&bars, &sr_cfg());

        assert!(states[1].resistance[0].is_none());
        let at6 = &states[6].resistance;
        let prices: Vec<f64> = at6.iter().flatten().map(|l| l.price).collect();
        assert_eq!(prices, vec![15.0, 13.0, 12.0]);
        // index 7 is not known until bar 8
        assert_eq!(states[7].resistance[1].map(|l| l.price), Some(13.0));
        let at8: Vec<f64> = states[8].resistance.iter().flatten().map(|l| l.price).collect();
        assert_eq!(at8, vec![15.0, 14.0, 13.0]);
    }

    #[test]
    fn strength_counts_closes_up_to_now() {
        let bars = flat(&[10.0, 12.0, 10.0, 15.0, 10.0, 13.0, 10.0, 14.0, 10.0]);
        let states = track_levels(&bars, &sr_cfg());
        let support = states[8].support[0].unwrap();
        assert_eq!(support.price, 10.0);
        assert_eq!(support.strength, 5);
        let s4 = states[4].support[0].unwrap();
        assert_eq!(s4.strength, 3);
    }

    #[test]
    fn strength_matches_recount() {
        let bars = flat(&[10.0, 12.0, 10.1, 15.0, 9.95, 13.0, 10.0, 14.0, 10.05, 12.1, 10.0]);
        let cfg = sr_cfg();
        let states = track_levels(&bars, &cfg);
        for (t, state) in states.iter().enumerate() {
            for level in state.support.iter().chain(&state.resistance).flatten() {
                let expected = bars[..=t]
                    .iter()
                    .filter(|b| (b.close - level.price).abs() <= level.price * cfg.touch_tolerance_pct)
                    .count();
                assert_eq!(level.strength, expected, "bar {t}");
            }
        }
    }

    #[test]
    fn fibonacci_retracements() {
        let bars: Vec<OhlcvBar> = (0..10)
            .map(|i| {
                let c = 100.0 + i as f64 * 10.0;
                bar(i, c, c + 5.0, c - 5.0, c, 1000.0)
            })
            .collect();
        let cfg = FibonacciConfig {
            swing_lookback: 6,
            levels: vec![0.5, 0.618],
            round_step: 50.0,
        };
        let fib = fibonacci_levels(&bars, &cfg);
        assert!(fib[1].swing_high.is_none());
        // partial window of 3 bars
        assert_eq!(fib[2].swing_high, Some(125.0));
        assert_eq!(fib[2].swing_low, Some(95.0));
        assert_relative_eq!(fib[2].levels[0].unwrap(), 110.0);

        // full window 4..=9
        assert_eq!(fib[9].swing_high, Some(195.0));
        assert_eq!(fib[9].swing_low, Some(135.0));
        assert_relative_eq!(fib[9].levels[1].unwrap(), 195.0 - 60.0 * 0.618);
        assert_eq!(fib[9].round_support, Some(200.0));
        assert!(fib[0].levels.iter().all(Option::is_none));
    }

    #[test]
    fn round_support_ties_to_even() {
        let bars = flat(&[7500.0, 12500.0]);
        let fib = fibonacci_levels(&bars, &FibonacciConfig::default());
        assert_eq!(fib[0].round_support, Some(10000.0));
        assert_eq!(fib[1].round_support, Some(10000.0));
    }
}
