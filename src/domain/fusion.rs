//! Signal fusion: combines the detector outputs of each bar into one
//! buy/sell/hold classification.
//!
//! Independent confirmation tracks are OR-ed together and the result is
//! gated by trend, volume and RSI filters. Long wins over short on the same
//! bar. The signal is stateless: it says nothing about open positions.

use std::fmt;

use crate::domain::patterns::gaps::GapDirection;
use crate::domain::patterns::volume_spikes;
use crate::domain::pipeline::EnrichedBar;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Signal {
    pub fn as_i8(self) -> i8 {
        match self {
            Signal::Buy => 1,
            Signal::Sell => -1,
            Signal::Hold => 0,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FusionConfig {
    pub require_trend: bool,
    pub require_volume: bool,
    pub volume_period: usize,
    pub volume_multiplier: f64,
    pub use_candlestick: bool,
    pub use_continuation: bool,
    pub use_chart_patterns: bool,
    pub use_divergence: bool,
    pub use_gaps: bool,
    pub use_breakouts: bool,
    pub use_trendlines: bool,
    pub use_money_flow: bool,
    pub use_wave: bool,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            require_trend: true,
            require_volume: true,
            volume_period: 20,
            volume_multiplier: 1.5,
            use_candlestick: true,
            use_continuation: true,
            use_chart_patterns: true,
            use_divergence: true,
            use_gaps: true,
            use_breakouts: true,
            use_trendlines: true,
            use_money_flow: true,
            use_wave: true,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
        }
    }
}

/// Confirmation tracks that agree with a long entry.
fn long_tracks(bar: &EnrichedBar, cfg: &FusionConfig) -> bool {
    let c = &bar.chart;
    let ind = &bar.indicators;
    let money_flow = ind.cmf.is_some_and(|v| v > 0.0)
        && ind.volume_osc.is_some_and(|v| v > 0.0)
        && ind.vwap.is_some_and(|v| bar.bar.close > v);

    (cfg.use_candlestick && bar.candles.bullish_reversal())
        || (cfg.use_continuation && bar.candles.bullish_continuation())
        || (cfg.use_chart_patterns && (c.double_bottom_confirmed || c.hs_bottom_confirmed))
        || (cfg.use_divergence && bar.divergence.any_bullish())
        || (cfg.use_gaps && bar.gap.is_some_and(|g| g.is_breakout(GapDirection::Up)))
        || (cfg.use_breakouts
            && (c.triangle_break_up || c.bull_flag || c.rectangle_break_up || c.falling_wedge))
        || (cfg.use_trendlines && bar.trend.trendline_break_up)
        || (cfg.use_money_flow && money_flow)
        || (cfg.use_wave && bar.wave.wave_confirmed)
}

/// The short side listens to fewer tracks.
fn short_tracks(bar: &EnrichedBar, cfg: &FusionConfig) -> bool {
    let c = &bar.chart;
    (cfg.use_candlestick && bar.candles.bearish_reversal())
        || (cfg.use_continuation && bar.candles.bearish_continuation())
        || (cfg.use_chart_patterns && (c.double_top_confirmed || c.hs_top_confirmed))
        || (cfg.use_divergence && bar.divergence.any_bearish())
        || (cfg.use_breakouts
            && (c.triangle_break_down || c.rectangle_break_down || c.bear_flag || c.rising_wedge))
}

/// Classifies one bar. `volume_spike` comes from the bar's volume against
/// its trailing mean.
pub fn classify(bar: &EnrichedBar, volume_spike: bool, cfg: &FusionConfig) -> Signal {
    let close = bar.bar.close;
    let trend = bar.indicators.ema_very_long;
    let rsi = bar.indicators.rsi;
    let volume_ok = !cfg.require_volume || volume_spike;

    let uptrend_ok = !cfg.require_trend || trend.is_some_and(|e| close > e);
    if uptrend_ok && volume_ok && rsi.is_some_and(|r| r < cfg.rsi_overbought) && long_tracks(bar, cfg) {
        return Signal::Buy;
    }

    let downtrend_ok = !cfg.require_trend || trend.is_some_and(|e| close < e);
    if downtrend_ok && volume_ok && rsi.is_some_and(|r| r > cfg.rsi_oversold) && short_tracks(bar, cfg) {
        return Signal::Sell;
    }
    Signal::Hold
}

/// Writes the fused signal into every bar.
pub fn apply_signals(enriched: &mut [EnrichedBar], cfg: &FusionConfig) {
    let raw: Vec<_> = enriched.iter().map(|e| e.bar.clone()).collect();
    let spikes = volume_spikes(&raw, cfg.volume_period, cfg.volume_multiplier);
    for (bar, spike) in enriched.iter_mut().zip(spikes) {
        bar.signal = classify(bar, spike, cfg);
    }
    let buys = enriched.iter().filter(|b| b.signal == Signal::Buy).count();
    let sells = enriched.iter().filter(|b| b.signal == Signal::Sell).count();
    tracing::info!(buys, sells, "signals generated");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::IndicatorRow;
    use crate::domain::testkit::bar;

    fn enriched(close: f64) -> EnrichedBar {
        let mut e = EnrichedBar::new(bar(0, close, close + 1.0, close - 1.0, close, 1000.0));
        e.indicators = IndicatorRow {
            ema_very_long: Some(90.0),
            rsi: Some(50.0),
            ..IndicatorRow::default()
        };
        e
    }

    #[test]
    fn signal_values() {
        assert_eq!(Signal::Buy.as_i8(), 1);
        assert_eq!(Signal::Sell.as_i8(), -1);
        assert_eq!(Signal::Hold.as_i8(), 0);
        assert_eq!(Signal::Sell.to_string(), "-1");
        assert_eq!(Signal::default(), Signal::Hold);
    }

    #[test]
    fn no_tracks_means_hold() {
        assert_eq!(classify(&enriched(100.0), true, &FusionConfig::default()), Signal::Hold);
    }

    #[test]
    fn long_needs_trend_volume_and_rsi() {
        let cfg = FusionConfig::default();
        let mut e = enriched(100.0);
        e.candles.hammer = true;
        assert_eq!(classify(&e, true, &cfg), Signal::Buy);
        assert_eq!(classify(&e, false, &cfg), Signal::Hold);

        e.indicators.rsi = Some(75.0);
        assert_eq!(classify(&e, true, &cfg), Signal::Hold);

        e.indicators.rsi = Some(50.0);
        e.indicators.ema_very_long = Some(110.0);
        assert_eq!(classify(&e, true, &cfg), Signal::Hold);
    }

    #[test]
    fn filters_can_be_switched_off() {
        let cfg = FusionConfig {
            require_trend: false,
            require_volume: false,
            ..FusionConfig::default()
        };
        let mut e = enriched(100.0);
        e.indicators.ema_very_long = None;
        e.wave.wave_confirmed = true;
        assert_eq!(classify(&e, false, &cfg), Signal::Buy);
    }

    #[test]
    fn short_in_downtrend() {
        let cfg = FusionConfig::default();
        let mut e = enriched(80.0);
        e.chart.double_top_confirmed = true;
        assert_eq!(classify(&e, true, &cfg), Signal::Sell);
        e.indicators.rsi = Some(25.0);
        assert_eq!(classify(&e, true, &cfg), Signal::Hold);
    }

    #[test]
    fn long_takes_precedence() {
        let cfg = FusionConfig {
            require_trend: false,
            ..FusionConfig::default()
        };
        let mut e = enriched(100.0);
        e.divergence.rsi_bullish_div = true;
        e.divergence.rsi_bearish_div = true;
        assert_eq!(classify(&e, true, &cfg), Signal::Buy);
    }

    #[test]
    fn disabled_track_is_ignored() {
        let cfg = FusionConfig {
            use_trendlines: false,
            ..FusionConfig::default()
        };
        let mut e = enriched(100.0);
        e.trend.trendline_break_up = true;
        assert_eq!(classify(&e, true, &cfg), Signal::Hold);
        assert_eq!(classify(&e, true, &FusionConfig::default()), Signal::Buy);
    }

    #[test]
    fn money_flow_alignment() {
        let mut e = enriched(100.0);
        e.indicators.cmf = Some(0.1);
        e.indicators.volume_osc = Some(5.0);
        e.indicators.vwap = Some(95.0);
        assert_eq!(classify(&e, true, &FusionConfig::default()), Signal::Buy);
        e.indicators.vwap = None;
        assert_eq!(classify(&e, true, &FusionConfig::default()), Signal::Hold);
    }
}
