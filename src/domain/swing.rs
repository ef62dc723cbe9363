//! Swing point (local extremum) discovery shared by the pattern detectors.
//!
//! A bar is a swing high when its value is >= every neighbour within
//! `order` bars on each side (<= for swing lows). Neighbours before the
//! start of the series clip to the first bar. A swing at index `i` only
//! becomes known at bar `i + order`, so points whose right-hand
//! neighbourhood is incomplete are not reported.

use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwingKind {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingPoint {
    pub index: usize,
    pub price: f64,
    pub kind: SwingKind,
    /// First bar at which this point may be used.
    pub confirmed_at: usize,
}

impl SwingPoint {
    pub fn is_known_at(&self, bar: usize) -> bool {
        self.confirmed_at <= bar
    }
}

fn find_extrema(values: &[f64], order: usize, kind: SwingKind) -> Vec<SwingPoint> {
    let order = order.max(1);
    let n = values.len();
    let wins = |a: f64, b: f64| match kind {
        SwingKind::High => a >= b,
        SwingKind::Low => a <= b,
    };

    let mut out = Vec::new();
    for i in 0..n {
        if i + order >= n {
            break;
        }
        let v = values[i];
        let left_ok = (1..=order).all(|k| wins(v, values[i.saturating_sub(k)]));
        let right_ok = (1..=order).all(|k| wins(v, values[i + k]));
        if left_ok && right_ok {
            out.push(SwingPoint {
                index: i,
                price: v,
                kind,
                confirmed_at: i + order,
            });
        }
    }
    out
}

/// Swing highs over bar highs.
pub fn swing_highs(bars: &[OhlcvBar], order: usize) -> Vec<SwingPoint> {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    find_extrema(&highs, order, SwingKind::High)
}

/// Swing lows over bar lows.
pub fn swing_lows(bars: &[OhlcvBar], order: usize) -> Vec<SwingPoint> {
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    find_extrema(&lows, order, SwingKind::Low)
}

/// Points of an index-ordered list that are known at `bar`.
///
/// `confirmed_at` grows with `index` for a fixed order, so the known points
/// form a prefix.
pub fn known_at(points: &[SwingPoint], bar: usize) -> &[SwingPoint] {
    let end = points.partition_point(|p| p.confirmed_at <= bar);
    &points[..end]
}

/// Merges highs and lows in index order (highs first on a tie).
pub fn merge_by_index(highs: &[SwingPoint], lows: &[SwingPoint]) -> Vec<SwingPoint> {
    let mut all: Vec<SwingPoint> = highs.iter().chain(lows).copied().collect();
    all.sort_by(|a, b| {
        a.index
            .cmp(&b.index)
            .then_with(|| (a.kind == SwingKind::Low).cmp(&(b.kind == SwingKind::Low)))
    });
    all
}

/// Alternating high/low sequence built one point at a time.
///
/// When a point has the same kind as the last one kept, the more extreme
/// of the two survives. Feeding points in known order keeps the sequence
/// causal.
#[derive(Debug, Clone, Default)]
pub struct Zigzag {
    points: Vec<SwingPoint>,
}

impl Zigzag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: SwingPoint) {
        match self.points.last_mut() {
            Some(last) if last.kind == point.kind => {
                let more_extreme = match point.kind {
                    SwingKind::High => point.price > last.price,
                    SwingKind::Low => point.price < last.price,
                };
                if more_extreme {
                    *last = point;
                }
            }
            _ => self.points.push(point),
        }
    }

    pub fn points(&self) -> &[SwingPoint] {
        &self.points
    }

    /// The most recent `n` points (fewer if not available).
    pub fn tail(&self, n: usize) -> &[SwingPoint] {
        &self.points[self.points.len().saturating_sub(n)..]
    }
}
