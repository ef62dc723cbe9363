//! Fitted trendlines through recent swing points plus a Donchian channel.

use crate::domain::indicator::{rolling_max, rolling_min};
use crate::domain::ohlcv::{OhlcvBar, highs, lows};
use crate::domain::swing::{SwingPoint, known_at, swing_highs, swing_lows};

const FIT_POINTS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendlineConfig {
    pub enabled: bool,
    pub extrema_order: usize,
    pub channel_period: usize,
}

impl Default for TrendlineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            extrema_order: 20,
            channel_period: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrendlineState {
    pub upper_trendline: Option<f64>,
    pub lower_trendline: Option<f64>,
    pub donchian_upper: Option<f64>,
    pub donchian_lower: Option<f64>,
    pub trendline_break_up: bool,
    pub trendline_break_down: bool,
    pub channel_width_pct: Option<f64>,
}

/// Least-squares line through `points`, as (slope, intercept) over bar index.
pub fn fit_line(points: &[SwingPoint]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.index as f64).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.price).sum::<f64>() / n;
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for p in points {
        let dx = p.index as f64 - mean_x;
        sxy += dx * (p.price - mean_y);
        sxx += dx * dx;
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

fn line_at(points: &[SwingPoint], bar: usize) -> Option<f64> {
    if points.len() < FIT_POINTS {
        return None;
    }
    let (slope, intercept) = fit_line(&points[points.len() - FIT_POINTS..])?;
    Some(slope * bar as f64 + intercept)
}

pub fn detect_trendlines(bars: &[OhlcvBar], cfg: &TrendlineConfig) -> Vec<TrendlineState> {
    let n = bars.len();
    if !cfg.enabled {
        return vec![TrendlineState::default(); n];
    }

    let sh = swing_highs(bars, cfg.extrema_order);
    let sl = swing_lows(bars, cfg.extrema_order);
    let upper = rolling_max(&highs(bars), cfg.channel_period);
    let lower = rolling_min(&lows(bars), cfg.channel_period);

    let states: Vec<TrendlineState> = bars
        .iter()
        .enumerate()
        .map(|(t, bar)| {
            let upper_trendline = line_at(known_at(&sh, t), t);
            let lower_trendline = line_at(known_at(&sl, t), t);
            let prev_upper = t.checked_sub(1).and_then(|p| upper[p]);
            let prev_lower = t.checked_sub(1).and_then(|p| lower[p]);

            let above = |level: Option<f64>| level.is_some_and(|l| bar.close > l);
            let below = |level: Option<f64>| level.is_some_and(|l| bar.close < l);

            TrendlineState {
                upper_trendline,
                lower_trendline,
                donchian_upper: upper[t],
                donchian_lower: lower[t],
                trendline_break_up: above(upper_trendline) || above(prev_upper),
                trendline_break_down: below(lower_trendline) || below(prev_lower),
                channel_width_pct: match (upper[t], lower[t]) {
                    (Some(u), Some(l)) if bar.close != 0.0 => Some((u - l) / bar.close),
                    _ => None,
                },
            }
        })
        .collect();

    tracing::debug!(
        breaks_up = states.iter().filter(|s| s.trendline_break_up).count(),
        breaks_down = states.iter().filter(|s| s.trendline_break_down).count(),
        "trendline scan complete"
    );
    states
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::swing::SwingKind;
    use crate::domain::testkit::ohlc_bars;
    use approx::assert_relative_eq;

    fn flat(values: &[f64]) -> Vec<OhlcvBar> {
        let rows: Vec<_> = values.iter().map(|&v| (v, v, v, v)).collect();
        ohlc_bars(&rows)
    }

    fn cfg() -> TrendlineConfig {
        TrendlineConfig {
            enabled: true,
            extrema_order: 1,
            channel_period: 3,
        }
    }

    #[test]
    fn fit_line_exact() {
        let p = |index, price| SwingPoint {
            index,
            price,
            kind: SwingKind::High,
            confirmed_at: index,
        };
        let (slope, intercept) = fit_line(&[p(1, 5.0), p(3, 6.0), p(5, 7.0)]).unwrap();
        assert_relative_eq!(slope, 0.5);
        assert_relative_eq!(intercept, 4.5);
        assert!(fit_line(&[p(2, 1.0), p(2, 3.0)]).is_none());
    }

    #[test]
    fn trendlines_use_only_known_points() {
        let bars = flat(&[1.0, 5.0, 1.0, 6.0, 1.0, 7.0, 1.0, 8.0]);
        let states = detect_trendlines(&bars, &cfg());
        // third swing high (index 5) becomes known at bar 6
        assert!(states[5].upper_trendline.is_none());
        assert_relative_eq!(states[6].upper_trendline.unwrap(), 7.5);
        assert_relative_eq!(states[6].lower_trendline.unwrap(), 1.0);
    }

    #[test]
    fn donchian_break_and_width() {
        let bars = flat(&[1.0, 5.0, 1.0, 6.0, 1.0, 7.0, 1.0, 8.0]);
        let states = detect_trendlines(&bars, &cfg());
        let last = states[7];
        assert!(last.trendline_break_up);
        assert!(!last.trendline_break_down);
        assert_eq!(last.donchian_upper, Some(8.0));
        assert_relative_eq!(last.channel_width_pct.unwrap(), 0.875);
        assert!(!states[0].trendline_break_up);
        assert!(states[0].donchian_upper.is_none());
    }

    #[test]
    fn disabled_is_blank() {
        let bars = flat(&[1.0, 5.0, 1.0, 6.0, 1.0, 7.0, 1.0, 8.0]);
        let states = detect_trendlines(
            &bars,
            &TrendlineConfig {
                enabled: false,
                ..cfg()
            },
        );
        assert!(states.iter().all(|s| *s == TrendlineState::default()));
    }
}
