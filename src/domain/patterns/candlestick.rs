//! Candlestick pattern detection from bar geometry.
//!
//! Every flag is a pure function of a window of one to five bars ending at
//! the bar being classified.

use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, PartialEq)]
pub struct CandlestickConfig {
    /// Shadow must be at least this multiple of the body to count as long.
    pub long_shadow_ratio: f64,
    pub small_body_ratio: f64,
    pub doji_ratio: f64,
    pub very_small_body_ratio: f64,
    pub hammer_upper_shadow_ratio: f64,
    pub shooting_star_lower_shadow_ratio: f64,
    /// Engulfing bar must also contain the prior bar's high and low.
    pub engulfing_strict: bool,
    pub piercing_ratio: f64,
    pub harami_small_body_ratio: f64,
    pub three_methods_small_ratio: f64,
    pub three_methods_large_ratio: f64,
    /// Minimum real-body gap as a fraction of the prior close.
    pub gap_ratio: f64,
    pub similar_body_ratio: f64,
}

impl Default for CandlestickConfig {
    fn default() -> Self {
        Self {
            long_shadow_ratio: 2.0,
            small_body_ratio: 0.3,
            doji_ratio: 0.1,
            very_small_body_ratio: 0.1,
            hammer_upper_shadow_ratio: 0.5,
            shooting_star_lower_shadow_ratio: 0.5,
            engulfing_strict: true,
            piercing_ratio: 0.5,
            harami_small_body_ratio: 0.5,
            three_methods_small_ratio: 0.3,
            three_methods_large_ratio: 0.6,
            gap_ratio: 0.0,
            similar_body_ratio: 0.1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandleFlags {
    pub doji: bool,
    pub dragonfly_doji: bool,
    pub gravestone_doji: bool,
    pub long_legged_doji: bool,
    pub spinning_top: bool,
    pub hammer: bool,
    pub hanging_man: bool,
    pub inverted_hammer: bool,
    pub shooting_star: bool,
    pub bullish_engulfing: bool,
    pub bearish_engulfing: bool,
    pub piercing: bool,
    pub dark_cloud_cover: bool,
    pub morning_star: bool,
    pub evening_star: bool,
    pub three_white_soldiers: bool,
    pub three_black_crows: bool,
    pub bullish_harami: bool,
    pub bearish_harami: bool,
    pub bullish_harami_cross: bool,
    pub bearish_harami_cross: bool,
    pub rising_three_methods: bool,
    pub falling_three_methods: bool,
    pub upside_gap_two_crows: bool,
    pub upside_tasuki_gap: bool,
    pub downside_tasuki_gap: bool,
    pub bullish_side_by_side: bool,
    pub bearish_side_by_side: bool,
    pub bullish_separating_lines: bool,
    pub bearish_separating_lines: bool,
    pub gap_up: bool,
    pub gap_down: bool,
}

impl CandleFlags {
    pub fn bullish_reversal(&self) -> bool {
        self.hammer
            || self.inverted_hammer
            || self.dragonfly_doji
            || self.bullish_engulfing
            || self.piercing
            || self.morning_star
            || self.three_white_soldiers
            || self.bullish_harami
            || self.bullish_harami_cross
    }

    pub fn bearish_reversal(&self) -> bool {
        self.shooting_star
            || self.gravestone_doji
            || self.bearish_engulfing
            || self.dark_cloud_cover
            || self.evening_star
            || self.three_black_crows
            || self.bearish_harami
            || self.bearish_harami_cross
            || self.upside_gap_two_crows
    }

    pub fn bullish_continuation(&self) -> bool {
        self.rising_three_methods
            || self.upside_tasuki_gap
            || self.bullish_side_by_side
            || self.bullish_separating_lines
    }

    pub fn bearish_continuation(&self) -> bool {
        self.falling_three_methods
            || self.downside_tasuki_gap
            || self.bearish_side_by_side
            || self.bearish_separating_lines
    }

    /// Flag names paired with their values, in report column order.
    pub fn named(&self) -> [(&'static str, bool); 32] {
        [
            ("doji", self.doji),
            ("dragonfly_doji", self.dragonfly_doji),
            ("gravestone_doji", self.gravestone_doji),
            ("long_legged_doji", self.long_legged_doji),
            ("spinning_top", self.spinning_top),
            ("hammer", self.hammer),
            ("hanging_man", self.hanging_man),
            ("inverted_hammer", self.inverted_hammer),
            ("shooting_star", self.shooting_star),
            ("bullish_engulfing", self.bullish_engulfing),
            ("bearish_engulfing", self.bearish_engulfing),
            ("piercing", self.piercing),
            ("dark_cloud_cover", self.dark_cloud_cover),
            ("morning_star", self.morning_star),
            ("evening_star", self.evening_star),
            ("three_white_soldiers", self.three_white_soldiers),
            ("three_black_crows", self.three_black_crows),
            ("bullish_harami", self.bullish_harami),
            ("bearish_harami", self.bearish_harami),
            ("bullish_harami_cross", self.bullish_harami_cross),
            ("bearish_harami_cross", self.bearish_harami_cross),
            ("rising_three_methods", self.rising_three_methods),
            ("falling_three_methods", self.falling_three_methods),
            ("upside_gap_two_crows", self.upside_gap_two_crows),
            ("upside_tasuki_gap", self.upside_tasuki_gap),
            ("downside_tasuki_gap", self.downside_tasuki_gap),
            ("bullish_side_by_side", self.bullish_side_by_side),
            ("bearish_side_by_side", self.bearish_side_by_side),
            ("bullish_separating_lines", self.bullish_separating_lines),
            ("bearish_separating_lines", self.bearish_separating_lines),
            ("gap_up", self.gap_up),
            ("gap_down", self.gap_down),
        ]
    }
}

/// Classifies every bar of the series.
pub fn detect_candlesticks(bars: &[OhlcvBar], cfg: &CandlestickConfig) -> Vec<CandleFlags> {
    (0..bars.len()).map(|i| classify(bars, i, cfg)).collect()
}

/// Classifies bar `index` using only `bars[..=index]`.
pub fn classify(bars: &[OhlcvBar], index: usize, cfg: &CandlestickConfig) -> CandleFlags {
    let cur = &bars[index];
    let prev = index.checked_sub(1).map(|i| &bars[i]);
    let prev2 = index.checked_sub(2).map(|i| &bars[i]);

    let shape = Shape::of(cur, cfg);
    let hammer_shape = shape.long_lower
        && cur.upper_shadow() <= cur.body() * cfg.hammer_upper_shadow_ratio
        && shape.small;
    let star_shape = shape.long_upper
        && cur.lower_shadow() <= cur.body() * cfg.shooting_star_lower_shadow_ratio
        && shape.small;

    let mut flags = CandleFlags {
        doji: shape.doji,
        dragonfly_doji: shape.doji && shape.long_lower,
        gravestone_doji: shape.doji && shape.long_upper,
        long_legged_doji: shape.doji && shape.long_lower && shape.long_upper,
        spinning_top: shape.small && shape.long_lower && shape.long_upper,
        hammer: hammer_shape,
        hanging_man: hammer_shape,
        inverted_hammer: star_shape,
        shooting_star: star_shape,
        ..CandleFlags::default()
    };

    if let Some(p) = prev {
        flags.bullish_engulfing = bullish_engulfing(p, cur, cfg);
        flags.bearish_engulfing = bearish_engulfing(p, cur, cfg);
        flags.piercing = p.is_bearish()
            && cur.is_bullish()
            && cur.open < p.low
            && cur.close > p.open - p.body() * cfg.piercing_ratio;
        flags.dark_cloud_cover = p.is_bullish()
            && cur.is_bearish()
            && cur.open > p.high
            && cur.close < p.open + p.body() * cfg.piercing_ratio;
        let inside = body_inside(cur, p);
        flags.bullish_harami = p.is_bearish()
            && cur.is_bullish()
            && inside
            && cur.body() <= p.body() * cfg.harami_small_body_ratio;
        flags.bearish_harami = p.is_bullish()
            && cur.is_bearish()
            && inside
            && cur.body() <= p.body() * cfg.harami_small_body_ratio;
        flags.bullish_harami_cross = p.is_bearish() && shape.doji && inside;
        flags.bearish_harami_cross = p.is_bullish() && shape.doji && inside;
        let similar_open = (cur.open - p.open).abs() <= p.range() * cfg.similar_body_ratio;
        let comparable_body = cur.body() >= p.body() * (1.0 - cfg.similar_body_ratio);
        flags.bullish_separating_lines =
            p.is_bearish() && cur.is_bullish() && similar_open && comparable_body;
        flags.bearish_separating_lines =
            p.is_bullish() && cur.is_bearish() && similar_open && comparable_body;
        flags.gap_up = cur.low > p.high;
        flags.gap_down = cur.high < p.low;
    }

    if let (Some(first), Some(second)) = (prev2, prev) {
        let middle_tiny = second.body_ratio() <= cfg.very_small_body_ratio;
        flags.morning_star =
            first.is_bearish() && middle_tiny && cur.is_bullish() && cur.close > first.body_mid();
        flags.evening_star =
            first.is_bullish() && middle_tiny && cur.is_bearish() && cur.close < first.body_mid();
        flags.three_white_soldiers = [first, second, cur].iter().all(|b| b.is_bullish())
            && cur.close > second.close
            && second.close > first.close
            && cur.open > second.open
            && second.open > first.open;
        flags.three_black_crows = [first, second, cur].iter().all(|b| b.is_bearish())
            && cur.close < second.close
            && second.close < first.close
            && cur.open < second.open
            && second.open < first.open;
        flags.upside_gap_two_crows = upside_gap_two_crows(first, second, cur, cfg);
        flags.upside_tasuki_gap = upside_tasuki(first, second, cur, cfg);
        flags.downside_tasuki_gap = downside_tasuki(first, second, cur, cfg);
        flags.bullish_side_by_side = first.is_bullish()
            && body_gap_up(first, second, cfg)
            && side_by_side_whites(second, cur, cfg);
        flags.bearish_side_by_side = first.is_bearish()
            && body_gap_down(first, second, cfg)
            && side_by_side_whites(second, cur, cfg);
    }

    if index >= 4 {
        let window = &bars[index - 4..=index];
        flags.rising_three_methods = three_methods(window, cfg, true);
        flags.falling_three_methods = three_methods(window, cfg, false);
    }

    flags
}

struct Shape {
    long_lower: bool,
    long_upper: bool,
    small: bool,
    doji: bool,
}

impl Shape {
    fn of(bar: &OhlcvBar, cfg: &CandlestickConfig) -> Self {
        let body = bar.body();
        let ratio = bar.body_ratio();
        Self {
            long_lower: bar.lower_shadow() >= body * cfg.long_shadow_ratio,
            long_upper: bar.upper_shadow() >= body * cfg.long_shadow_ratio,
            small: ratio <= cfg.small_body_ratio,
            doji: ratio <= cfg.doji_ratio,
        }
    }
}

fn contains_range(outer: &OhlcvBar, inner: &OhlcvBar) -> bool {
    outer.high >= inner.high && outer.low <= inner.low
}

fn body_inside(inner: &OhlcvBar, outer: &OhlcvBar) -> bool {
    inner.body_top() <= outer.body_top() && inner.body_bottom() >= outer.body_bottom()
}

fn bullish_engulfing(p: &OhlcvBar, cur: &OhlcvBar, cfg: &CandlestickConfig) -> bool {
    let base = p.is_bearish() && cur.is_bullish() && cur.open < p.close && cur.close > p.open;
    base && (!cfg.engulfing_strict || (cur.body() > p.body() && contains_range(cur, p)))
}

fn bearish_engulfing(p: &OhlcvBar, cur: &OhlcvBar, cfg: &CandlestickConfig) -> bool {
    let base = p.is_bullish() && cur.is_bearish() && cur.open > p.close && cur.close < p.open;
    base && (!cfg.engulfing_strict || (cur.body() > p.body() && contains_range(cur, p)))
}

fn body_gap_up(first: &OhlcvBar, second: &OhlcvBar, cfg: &CandlestickConfig) -> bool {
    second.body_bottom() - first.body_top() > first.close * cfg.gap_ratio
}

fn body_gap_down(first: &OhlcvBar, second: &OhlcvBar, cfg: &CandlestickConfig) -> bool {
    first.body_bottom() - second.body_top() > first.close * cfg.gap_ratio
}

fn upside_gap_two_crows(
    first: &OhlcvBar,
    second: &OhlcvBar,
    cur: &OhlcvBar,
    cfg: &CandlestickConfig,
) -> bool {
    first.is_bullish()
        && second.is_bearish()
        && body_gap_up(first, second, cfg)
        && cur.is_bearish()
        && cur.open > second.open
        && cur.close < second.close
        && cur.close > first.close
}

fn upside_tasuki(first: &OhlcvBar, second: &OhlcvBar, cur: &OhlcvBar, cfg: &CandlestickConfig) -> bool {
    first.is_bullish()
        && second.is_bullish()
        && body_gap_up(first, second, cfg)
        && cur.is_bearish()
        && cur.open < second.close
        && cur.open > second.open
        && cur.close < second.open
        && cur.close > first.body_top()
}

fn downside_tasuki(first: &OhlcvBar, second: &OhlcvBar, cur: &OhlcvBar, cfg: &CandlestickConfig) -> bool {
    first.is_bearish()
        && second.is_bearish()
        && body_gap_down(first, second, cfg)
        && cur.is_bullish()
        && cur.open > second.close
        && cur.open < second.open
        && cur.close > second.open
        && cur.close < first.body_bottom()
}

/// Two bullish bars with similar bodies opening near the same level.
fn side_by_side_whites(second: &OhlcvBar, cur: &OhlcvBar, cfg: &CandlestickConfig) -> bool {
    let tolerance = second.body().max(cur.body()) * cfg.similar_body_ratio;
    second.is_bullish()
        && cur.is_bullish()
        && (cur.body() - second.body()).abs() <= tolerance
        && (cur.open - second.open).abs() <= tolerance.max(second.range() * cfg.similar_body_ratio)
}

fn three_methods(window: &[OhlcvBar], cfg: &CandlestickConfig, rising: bool) -> bool {
    let (first, middle, last) = (&window[0], &window[1..4], &window[4]);
    let large = |b: &OhlcvBar| b.body_ratio() >= cfg.three_methods_large_ratio;
    let small_inside = middle
        .iter()
        .all(|b| b.body_ratio() <= cfg.three_methods_small_ratio && b.high <= first.high && b.low >= first.low);
    if rising {
        first.is_bullish() && large(first) && small_inside && last.is_bullish() && large(last) && last.close > first.close
    } else {
        first.is_bearish() && large(first) && small_inside && last.is_bearish() && large(last) && last.close < first.close
    }
}
