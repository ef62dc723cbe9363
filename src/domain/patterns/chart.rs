//! Multi-bar chart formations found from swing points.
//!
//! Double tops/bottoms and head-and-shoulders are matched on swing points
//! once those points are known; the formation flag fires on that bar and
//! the `*_confirmed` flag latches from the first neckline break onward.
//! Triangles, wedges, flags and rectangles are evaluated bar by bar from
//! the swing points and rolling channels available at each bar.

use crate::domain::indicator::{rolling_max, rolling_mean_optional, rolling_min, sma_values};
use crate::domain::ohlcv::{OhlcvBar, closes, highs, lows};
use crate::domain::patterns::{Latch, volume_spikes};
use crate::domain::swing::{SwingKind, SwingPoint, Zigzag, known_at, merge_by_index, swing_highs, swing_lows};

const VOLUME_PERIOD: usize = 20;
const FLAG_MEAN_PERIOD: usize = 50;
const FLAG_NARROW_FACTOR: f64 = 0.8;
const TREND_SMA_PERIOD: usize = 200;
const RECTANGLE_PERIOD: usize = 50;
const RECTANGLE_MEAN_PERIOD: usize = 100;
const RECTANGLE_NARROW_FACTOR: f64 = 0.7;
const RECTANGLE_MIN_TOUCHES: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub extrema_order: usize,
    pub peak_trough_tolerance: f64,
    pub shoulder_tolerance: f64,
    pub require_volume_confirm: bool,
    pub volume_multiplier: f64,
    pub min_pattern_bars: usize,
    pub channel_period: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            extrema_order: 30,
            peak_trough_tolerance: 0.05,
            shoulder_tolerance: 0.10,
            require_volume_confirm: true,
            volume_multiplier: 1.5,
            min_pattern_bars: 10,
            channel_period: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormationKind {
    DoubleTop,
    DoubleBottom,
    HeadShouldersTop,
    HeadShouldersBottom,
}

impl FormationKind {
    /// Top formations confirm on a close below the neckline.
    fn breaks_down(self) -> bool {
        matches!(self, FormationKind::DoubleTop | FormationKind::HeadShouldersTop)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartFormation {
    pub kind: FormationKind,
    /// Bar of the middle peak/trough (the head for head-and-shoulders).
    pub apex_index: usize,
    /// Bar at which the last swing point of the formation became known.
    pub detected_at: usize,
    pub neckline: f64,
    /// First neckline break, if any.
    pub confirmed_at: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartFlags {
    pub double_top: bool,
    pub double_top_confirmed: bool,
    pub double_bottom: bool,
    pub double_bottom_confirmed: bool,
    pub head_shoulders_top: bool,
    pub hs_top_confirmed: bool,
    pub head_shoulders_bottom: bool,
    pub hs_bottom_confirmed: bool,
    pub ascending_triangle: bool,
    pub descending_triangle: bool,
    pub symmetrical_triangle: bool,
    pub triangle_break_up: bool,
    pub triangle_break_down: bool,
    pub rising_wedge: bool,
    pub falling_wedge: bool,
    pub bull_flag: bool,
    pub bear_flag: bool,
    pub rectangle: bool,
    pub rectangle_break_up: bool,
    pub rectangle_break_down: bool,
}

impl ChartFlags {
    pub fn named(&self) -> [(&'static str, bool); 20] {
        [
            ("double_top", self.double_top),
            ("double_top_confirmed", self.double_top_confirmed),
            ("double_bottom", self.double_bottom),
            ("double_bottom_confirmed", self.double_bottom_confirmed),
            ("head_shoulders_top", self.head_shoulders_top),
            ("hs_top_confirmed", self.hs_top_confirmed),
            ("head_shoulders_bottom", self.head_shoulders_bottom),
            ("hs_bottom_confirmed", self.hs_bottom_confirmed),
            ("ascending_triangle", self.ascending_triangle),
            ("descending_triangle", self.descending_triangle),
            ("symmetrical_triangle", self.symmetrical_triangle),
            ("triangle_break_up", self.triangle_break_up),
            ("triangle_break_down", self.triangle_break_down),
            ("rising_wedge", self.rising_wedge),
            ("falling_wedge", self.falling_wedge),
            ("bull_flag", self.bull_flag),
            ("bear_flag", self.bear_flag),
            ("rectangle", self.rectangle),
            ("rectangle_break_up", self.rectangle_break_up),
            ("rectangle_break_down", self.rectangle_break_down),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChartAnalysis {
    pub flags: Vec<ChartFlags>,
    pub formations: Vec<ChartFormation>,
}

/// Convergence geometry of the last three known swing highs and lows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    Ascending,
    Descending,
    Symmetrical,
    RisingWedge,
    FallingWedge,
}

pub fn detect_chart_patterns(bars: &[OhlcvBar], cfg: &ChartConfig) -> ChartAnalysis {
    let n = bars.len();
    let mut flags = vec![ChartFlags::default(); n];
    if n == 0 {
        return ChartAnalysis::default();
    }

    let spikes = volume_spikes(bars, VOLUME_PERIOD, cfg.volume_multiplier);
    let sh = swing_highs(bars, cfg.extrema_order);
    let sl = swing_lows(bars, cfg.extrema_order);

    let mut formations = double_formations(bars, &sh, &sl, cfg);
    formations.extend(head_shoulders_formations(bars, &sh, &sl, cfg));
    formations.sort_by_key(|f| (f.detected_at, f.apex_index));

    let mut latches = [Latch::new(); 4];
    for formation in &mut formations {
        formation.confirmed_at = neckline_break(bars, &spikes, formation, cfg);
        let slot = latch_slot(formation.kind);
        if let Some(at) = formation.confirmed_at {
            latches[slot].set(at);
        }
        let f = &mut flags[formation.detected_at];
        match formation.kind {
            FormationKind::DoubleTop => f.double_top = true,
            FormationKind::DoubleBottom => f.double_bottom = true,
            FormationKind::HeadShouldersTop => f.head_shoulders_top = true,
            FormationKind::HeadShouldersBottom => f.head_shoulders_bottom = true,
        }
    }
    let confirmed: Vec<Vec<bool>> = latches.iter().map(|l| l.series(n)).collect();
    for (i, f) in flags.iter_mut().enumerate() {
        f.double_top_confirmed = confirmed[0][i];
        f.double_bottom_confirmed = confirmed[1][i];
        f.hs_top_confirmed = confirmed[2][i];
        f.hs_bottom_confirmed = confirmed[3][i];
    }

    apply_convergence(bars, &sh, &sl, &spikes, cfg, &mut flags);
    apply_flags(bars, &spikes, cfg, &mut flags);
    apply_rectangles(bars, &spikes, &mut flags);

    tracing::debug!(
        formations = formations.len(),
        confirmed = formations.iter().filter(|f| f.confirmed_at.is_some()).count(),
        "chart pattern scan complete"
    );
    ChartAnalysis { flags, formations }
}

fn latch_slot(kind: FormationKind) -> usize {
    match kind {
        FormationKind::DoubleTop => 0,
        FormationKind::DoubleBottom => 1,
        FormationKind::HeadShouldersTop => 2,
        FormationKind::HeadShouldersBottom => 3,
    }
}

/// Triples of consecutive swing highs (tops) or lows (bottoms).
fn double_formations(
    bars: &[OhlcvBar],
    sh: &[SwingPoint],
    sl: &[SwingPoint],
    cfg: &ChartConfig,
) -> Vec<ChartFormation> {
    let tol = cfg.peak_trough_tolerance;
    let mut out = Vec::new();

    for w in sh.windows(3) {
        let (p1, p2, p3) = (w[0], w[1], w[2]);
        if p3.index - p1.index < cfg.min_pattern_bars {
            continue;
        }
        let (h1, h2, h3) = (p1.price, p2.price, p3.price);
        if h2 >= h1 * (1.0 - tol) && h2 >= h3 * (1.0 - tol) && (h1 - h3).abs() / h2 <= tol {
            let neckline = bars[p1.index..=p3.index]
                .iter()
                .map(|b| b.low)
                .fold(f64::INFINITY, f64::min);
            out.push(ChartFormation {
                kind: FormationKind::DoubleTop,
                apex_index: p2.index,
                detected_at: p3.confirmed_at,
                neckline,
                confirmed_at: None,
            });
        }
    }

    for w in sl.windows(3) {
        let (p1, p2, p3) = (w[0], w[1], w[2]);
        if p3.index - p1.index < cfg.min_pattern_bars {
            continue;
        }
        let (l1, l2, l3) = (p1.price, p2.price, p3.price);
        if l2 <= l1 * (1.0 + tol) && l2 <= l3 * (1.0 + tol) && (l1 - l3).abs() / l2.abs() <= tol {
            let neckline = bars[p1.index..=p3.index]
                .iter()
                .map(|b| b.high)
                .fold(f64::NEG_INFINITY, f64::max);
            out.push(ChartFormation {
                kind: FormationKind::DoubleBottom,
                apex_index: p2.index,
                detected_at: p3.confirmed_at,
                neckline,
                confirmed_at: None,
            });
        }
    }
    out
}

/// Shoulder-trough-head-trough-shoulder over the alternating swing sequence.
fn head_shoulders_formations(
    bars: &[OhlcvBar],
    sh: &[SwingPoint],
    sl: &[SwingPoint],
    cfg: &ChartConfig,
) -> Vec<ChartFormation> {
    let tol = cfg.peak_trough_tolerance;
    let mut out: Vec<ChartFormation> = Vec::new();
    let mut zigzag = Zigzag::new();

    for point in merge_by_index(sh, sl) {
        zigzag.push(point);
        let tail = zigzag.tail(5);
        if tail.len() < 5 || tail[4].index != point.index {
            continue;
        }
        let (ls, head, rs) = (tail[0], tail[2], tail[4]);
        if rs.index - ls.index < cfg.min_pattern_bars {
            continue;
        }
        let shoulders_match = (ls.price - rs.price).abs() / head.price.abs() <= cfg.shoulder_tolerance;
        let span = &bars[ls.index..=rs.index];
        let found = match ls.kind {
            SwingKind::High
                if head.price > ls.price * (1.0 + tol)
                    && head.price > rs.price * (1.0 + tol)
                    && shoulders_match =>
            {
                let neckline = span.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
                Some((FormationKind::HeadShouldersTop, neckline))
            }
            SwingKind::Low
                if head.price < ls.price * (1.0 - tol)
                    && head.price < rs.price * (1.0 - tol)
                    && shoulders_match =>
            {
                let neckline = span.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
                Some((FormationKind::HeadShouldersBottom, neckline))
            }
            _ => None,
        };
        if let Some((kind, neckline)) = found {
            let duplicate = out
                .iter()
                .any(|f| f.kind == kind && f.apex_index == head.index && f.detected_at == rs.confirmed_at);
            if !duplicate {
                out.push(ChartFormation {
                    kind,
                    apex_index: head.index,
                    detected_at: rs.confirmed_at,
                    neckline,
                    confirmed_at: None,
                });
            }
        }
    }
    out
}

/// First close through the neckline at or after the detection bar.
fn neckline_break(
    bars: &[OhlcvBar],
    spikes: &[bool],
    formation: &ChartFormation,
    cfg: &ChartConfig,
) -> Option<usize> {
    (formation.detected_at..bars.len()).find(|&i| {
        let through = if formation.kind.breaks_down() {
            bars[i].close < formation.neckline
        } else {
            bars[i].close > formation.neckline
        };
        through && (!cfg.require_volume_confirm || spikes[i])
    })
}

/// Classifies price-normalised slopes of the upper and lower boundaries.
pub fn classify_convergence(upper_slope: f64, lower_slope: f64, tolerance: f64) -> Option<Convergence> {
    let flat = tolerance * 0.1;
    let flat_upper = upper_slope.abs() < flat;
    let flat_lower = lower_slope.abs() < flat;

    if flat_upper && lower_slope > 0.0 && !flat_lower {
        Some(Convergence::Ascending)
    } else if flat_lower && upper_slope < 0.0 && !flat_upper {
        Some(Convergence::Descending)
    } else if upper_slope < 0.0 && lower_slope > 0.0 {
        Some(Convergence::Symmetrical)
    } else if upper_slope > 0.0 && lower_slope > upper_slope {
        Some(Convergence::RisingWedge)
    } else if lower_slope < 0.0 && upper_slope < lower_slope {
        Some(Convergence::FallingWedge)
    } else {
        None
    }
}

fn normalised_slope(points: &[SwingPoint], price: f64) -> Option<f64> {
    let [first, .., last] = points else {
        return None;
    };
    if price == 0.0 || last.index == first.index {
        return None;
    }
    Some((last.price - first.price) / (last.index - first.index) as f64 / price)
}

fn apply_convergence(
    bars: &[OhlcvBar],
    sh: &[SwingPoint],
    sl: &[SwingPoint],
    spikes: &[bool],
    cfg: &ChartConfig,
    flags: &mut [ChartFlags],
) {
    for (t, bar) in bars.iter().enumerate() {
        let highs = known_at(sh, t);
        let lows = known_at(sl, t);
        if highs.len() < 3 || lows.len() < 3 {
            continue;
        }
        let upper = &highs[highs.len() - 3..];
        let lower = &lows[lows.len() - 3..];
        let (Some(us), Some(ls)) = (normalised_slope(upper, bar.close), normalised_slope(lower, bar.close))
        else {
            continue;
        };
        let Some(shape) = classify_convergence(us, ls, cfg.peak_trough_tolerance) else {
            continue;
        };
        let f = &mut flags[t];
        match shape {
            Convergence::Ascending => f.ascending_triangle = true,
            Convergence::Descending => f.descending_triangle = true,
            Convergence::Symmetrical => f.symmetrical_triangle = true,
            Convergence::RisingWedge => f.rising_wedge = true,
            Convergence::FallingWedge => f.falling_wedge = true,
        }
        if matches!(
            shape,
            Convergence::Ascending | Convergence::Descending | Convergence::Symmetrical
        ) && spikes[t]
        {
            f.triangle_break_up = bar.close > upper[2].price;
            f.triangle_break_down = bar.close < lower[2].price;
        }
    }
}

/// Narrow channel on a volume spike, split by the long-term trend.
fn apply_flags(bars: &[OhlcvBar], spikes: &[bool], cfg: &ChartConfig, flags: &mut [ChartFlags]) {
    let close = closes(bars);
    let upper = rolling_max(&highs(bars), cfg.channel_period);
    let lower = rolling_min(&lows(bars), cfg.channel_period);
    let width: Vec<Option<f64>> = (0..bars.len())
        .map(|i| {
            let (u, l) = (upper[i]?, lower[i]?);
            (close[i] != 0.0).then(|| (u - l) / close[i])
        })
        .collect();
    let width_mean = rolling_mean_optional(&width, FLAG_MEAN_PERIOD);
    let trend = sma_values(&close, TREND_SMA_PERIOD);

    for i in 0..bars.len() {
        let narrow = matches!((width[i], width_mean[i]), (Some(w), Some(m)) if w < m * FLAG_NARROW_FACTOR);
        if !(narrow && spikes[i]) {
            continue;
        }
        if let Some(sma) = trend[i] {
            flags[i].bull_flag = close[i] > sma;
            flags[i].bear_flag = close[i] < sma;
        }
    }
}

/// Tight trading range with repeated edge touches; breaks compare the close
/// against the previous bar's range.
fn apply_rectangles(bars: &[OhlcvBar], spikes: &[bool], flags: &mut [ChartFlags]) {
    let n = bars.len();
    let support = rolling_min(&lows(bars), RECTANGLE_PERIOD);
    let resistance = rolling_max(&highs(bars), RECTANGLE_PERIOD);
    let range_pct: Vec<Option<f64>> = (0..n)
        .map(|i| {
            let (s, r) = (support[i]?, resistance[i]?);
            (bars[i].close != 0.0).then(|| (r - s) / bars[i].close)
        })
        .collect();
    let range_mean = rolling_mean_optional(&range_pct, RECTANGLE_MEAN_PERIOD);
    let touch: Vec<bool> = (0..n)
        .map(|i| match (support[i], resistance[i]) {
            (Some(s), Some(r)) => bars[i].low <= s * 1.01 || bars[i].high >= r * 0.99,
            _ => false,
        })
        .collect();

    for i in 0..n {
        let narrow = matches!((range_pct[i], range_mean[i]), (Some(p), Some(m)) if p < m * RECTANGLE_NARROW_FACTOR);
        let start = (i + 1).saturating_sub(RECTANGLE_PERIOD);
        let touches = touch[start..=i].iter().filter(|&&t| t).count();
        if !(narrow && touches > RECTANGLE_MIN_TOUCHES) {
            continue;
        }
        flags[i].rectangle = true;
        if i == 0 || !spikes[i] {
            continue;
        }
        if let (Some(r), Some(s)) = (resistance[i - 1], support[i - 1]) {
            flags[i].rectangle_break_up = bars[i].close > r;
            flags[i].rectangle_break_down = bars[i].close < s;
        }
    }
}
