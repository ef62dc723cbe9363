//! Simplified Elliott-wave labelling over the alternating swing sequence.

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::patterns::Latch;
use crate::domain::swing::{SwingPoint, Zigzag, merge_by_index, swing_highs, swing_lows};

/// Five impulse legs plus three corrective legs.
const WAVE_WINDOW: usize = 8;
const MIN_POINTS: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct ElliottConfig {
    pub enabled: bool,
    pub order: usize,
}

impl Default for ElliottConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            order: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaveState {
    /// Position (1..=8) of the latest known swing point within the most
    /// recent eight known points.
    pub wave_label: Option<u8>,
    pub wave_confirmed: bool,
}

pub fn label_waves(bars: &[OhlcvBar], cfg: &ElliottConfig) -> Vec<WaveState> {
    let n = bars.len();
    let mut out = vec![WaveState::default(); n];
    if !cfg.enabled {
        return out;
    }

    let points = merge_by_index(&swing_highs(bars, cfg.order), &swing_lows(bars, cfg.order));
    let mut zigzag = Zigzag::new();
    let mut latch = Latch::new();
    let mut next = 0;

    for (t, state) in out.iter_mut().enumerate() {
        let mut changed = false;
        while next < points.len() && points[next].is_known_at(t) {
            zigzag.push(points[next]);
            next += 1;
            changed = true;
        }
        let count = zigzag.points().len();
        if count > 0 {
            state.wave_label = u8::try_from(count.min(WAVE_WINDOW)).ok();
        }
        if changed && !latch.is_set() && third_wave_dominates(zigzag.tail(WAVE_WINDOW)) {
            latch.set(t);
        }
    }

    for (state, confirmed) in out.iter_mut().zip(latch.series(n)) {
        state.wave_confirmed = confirmed;
    }
    tracing::debug!(confirmed_at = ?latch.set_at(), "wave labelling complete");
    out
}

/// Wave 3 longer than both wave 1 and wave 5, measured on the first six
/// points of the window.
fn third_wave_dominates(points: &[SwingPoint]) -> bool {
    if points.len() < MIN_POINTS {
        return false;
    }
    let leg = |a: usize| (points[a + 1].price - points[a].price).abs();
    let (w1, w3, w5) = (leg(0), leg(2), leg(4));
    w3 > w1 && w3 > w5
}
