//! Analysis configuration loaded through [`ConfigPort`].
//!
//! INI keys are flattened per section, e.g. `[indicators] ema_short = 9`.
//! Indicator periods and RSI thresholds are required; every other key falls
//! back to the stage default when absent.

use crate::domain::divergence::DivergenceConfig;
use crate::domain::error::CryptotaError;
use crate::domain::execution::RiskConfig;
use crate::domain::fusion::FusionConfig;
use crate::domain::indicator::IndicatorConfig;
use crate::domain::levels::{FibonacciConfig, SupportResistanceConfig};
use crate::domain::patterns::candlestick::CandlestickConfig;
use crate::domain::patterns::chart::ChartConfig;
use crate::domain::patterns::gaps::GapConfig;
use crate::domain::patterns::trendline::TrendlineConfig;
use crate::domain::patterns::wave::ElliottConfig;
use crate::domain::resample::Timeframe;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Resample target; `None` keeps the native granularity.
    pub timeframe: Option<Timeframe>,
    pub indicators: IndicatorConfig,
    pub candlestick: CandlestickConfig,
    pub gaps: GapConfig,
    pub chart: ChartConfig,
    pub divergence: DivergenceConfig,
    pub obv_divergence: DivergenceConfig,
    pub elliott: ElliottConfig,
    pub trendlines: TrendlineConfig,
    pub fibonacci: FibonacciConfig,
    pub support_resistance: SupportResistanceConfig,
    pub fusion: FusionConfig,
    pub risk: RiskConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            timeframe: None,
            indicators: IndicatorConfig::default(),
            candlestick: CandlestickConfig::default(),
            gaps: GapConfig::default(),
            chart: ChartConfig::default(),
            divergence: DivergenceConfig::default(),
            obv_divergence: DivergenceConfig::obv_default(),
            elliott: ElliottConfig::default(),
            trendlines: TrendlineConfig::default(),
            fibonacci: FibonacciConfig::default(),
            support_resistance: SupportResistanceConfig::default(),
            fusion: FusionConfig::default(),
            risk: RiskConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, CryptotaError> {
        let timeframe = match config.get_string("data", "timeframe") {
            Some(rule) if !rule.trim().is_empty() => Some(Timeframe::parse(&rule)?),
            _ => None,
        };

        let loaded = AnalysisConfig {
            timeframe,
            indicators: load_indicators(config)?,
            candlestick: load_candlestick(config),
            gaps: load_gaps(config)?,
            chart: load_chart(config)?,
            divergence: load_divergence(config, "divergence", "indicator_tolerance", DivergenceConfig::default())?,
            obv_divergence: load_divergence(config, "obv_divergence", "obv_tolerance", DivergenceConfig::obv_default())?,
            elliott: load_elliott(config)?,
            trendlines: load_trendlines(config)?,
            fibonacci: load_fibonacci(config)?,
            support_resistance: load_support_resistance(config)?,
            fusion: load_fusion(config)?,
            risk: load_risk(config),
        };
        loaded.validate()?;
        tracing::debug!(timeframe = ?loaded.timeframe, "configuration loaded");
        Ok(loaded)
    }

    /// Cross-field and range checks.
    pub fn validate(&self) -> Result<(), CryptotaError> {
        let ind = &self.indicators;
        if ind.macd_fast >= ind.macd_slow {
            return Err(invalid("indicators", "macd_fast", "macd_fast must be below macd_slow"));
        }
        if ind.volume_osc_short >= ind.volume_osc_long {
            return Err(invalid(
                "indicators",
                "volume_osc_short",
                "volume_osc_short must be below volume_osc_long",
            ));
        }
        if ind.bollinger_std_dev <= 0.0 {
            return Err(invalid("indicators", "bollinger_std_dev", "bollinger_std_dev must be positive"));
        }

        let fusion = &self.fusion;
        if !(0.0..=100.0).contains(&fusion.rsi_oversold) || !(0.0..=100.0).contains(&fusion.rsi_overbought) {
            return Err(invalid("indicators", "rsi_overbought", "RSI thresholds must lie in [0, 100]"));
        }
        if fusion.rsi_oversold >= fusion.rsi_overbought {
            return Err(invalid(
                "indicators",
                "rsi_oversold",
                "rsi_oversold must be below rsi_overbought",
            ));
        }

        let risk = &self.risk;
        if risk.initial_capital <= 0.0 {
            return Err(invalid("risk", "initial_capital", "initial_capital must be positive"));
        }
        if risk.max_risk_per_trade <= 0.0 || risk.max_risk_per_trade > 1.0 {
            return Err(invalid(
                "risk",
                "max_risk_per_trade",
                "max_risk_per_trade must be between 0 and 1",
            ));
        }
        if risk.stop_loss_atr_multiplier <= 0.0 {
            return Err(invalid(
                "risk",
                "stop_loss_atr_multiplier",
                "stop_loss_atr_multiplier must be positive",
            ));
        }
        if risk.take_profit_rr <= 0.0 {
            return Err(invalid("risk", "take_profit_rr", "take_profit_rr must be positive"));
        }

        if self.fibonacci.levels.iter().any(|l| !(0.0..=1.0).contains(l)) {
            return Err(invalid("fibonacci", "levels", "levels must lie in [0, 1]"));
        }
        if self.fibonacci.round_step <= 0.0 {
            return Err(invalid("fibonacci", "round_step", "round_step must be positive"));
        }
        Ok(())
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> CryptotaError {
    CryptotaError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn required<T: std::str::FromStr>(config: &dyn ConfigPort, section: &str, key: &str) -> Result<T, CryptotaError> {
    let raw = config
        .get_string(section, key)
        .ok_or_else(|| CryptotaError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        })?;
    raw.trim()
        .parse()
        .map_err(|_| invalid(section, key, &format!("cannot parse '{}'", raw.trim())))
}

fn required_period(config: &dyn ConfigPort, section: &str, key: &str) -> Result<usize, CryptotaError> {
    let value: usize = required(config, section, key)?;
    if value == 0 {
        return Err(invalid(section, key, &format!("{key} must be positive")));
    }
    Ok(value)
}

fn optional_period(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> Result<usize, CryptotaError> {
    let value = config.get_int(section, key, default as i64);
    match usize::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(invalid(section, key, &format!("{key} must be positive"))),
    }
}

fn optional_fraction(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<f64, CryptotaError> {
    let value = config.get_double(section, key, default);
    if value < 0.0 || !value.is_finite() {
        return Err(invalid(section, key, &format!("{key} must be non-negative")));
    }
    Ok(value)
}

fn load_indicators(config: &dyn ConfigPort) -> Result<IndicatorConfig, CryptotaError> {
    let s = "indicators";
    let d = IndicatorConfig::default();
    Ok(IndicatorConfig {
        ema_short: required_period(config, s, "ema_short")?,
        ema_medium: required_period(config, s, "ema_medium")?,
        ema_long: required_period(config, s, "ema_long")?,
        ema_very_long: required_period(config, s, "ema_very_long")?,
        bollinger_period: required_period(config, s, "bollinger_period")?,
        bollinger_std_dev: config.get_double(s, "bollinger_std_dev", d.bollinger_std_dev),
        macd_fast: required_period(config, s, "macd_fast")?,
        macd_slow: required_period(config, s, "macd_slow")?,
        macd_signal: required_period(config, s, "macd_signal")?,
        rsi_period: required_period(config, s, "rsi_period")?,
        stochastic_period: required_period(config, s, "stochastic_period")?,
        stochastic_smooth_k: required_period(config, s, "stochastic_smooth_k")?,
        atr_period: optional_period(config, s, "atr_period", d.atr_period)?,
        cmf_period: optional_period(config, s, "cmf_period", d.cmf_period)?,
        vwap_period: optional_period(config, s, "vwap_period", d.vwap_period)?,
        volume_osc_short: optional_period(config, s, "volume_osc_short", d.volume_osc_short)?,
        volume_osc_long: optional_period(config, s, "volume_osc_long", d.volume_osc_long)?,
    })
}

fn load_candlestick(config: &dyn ConfigPort) -> CandlestickConfig {
    let s = "candlestick";
    let d = CandlestickConfig::default();
    CandlestickConfig {
        long_shadow_ratio: config.get_double(s, "long_shadow_ratio", d.long_shadow_ratio),
        small_body_ratio: config.get_double(s, "small_body_ratio", d.small_body_ratio),
        doji_ratio: config.get_double(s, "doji_ratio", d.doji_ratio),
        very_small_body_ratio: config.get_double(s, "very_small_body_ratio", d.very_small_body_ratio),
        hammer_upper_shadow_ratio: config.get_double(s, "hammer_upper_shadow_ratio", d.hammer_upper_shadow_ratio),
        shooting_star_lower_shadow_ratio: config.get_double(
            s,
            "shooting_star_lower_shadow_ratio",
            d.shooting_star_lower_shadow_ratio,
        ),
        engulfing_strict: config.get_bool(s, "engulfing_strict", d.engulfing_strict),
        piercing_ratio: config.get_double(s, "piercing_ratio", d.piercing_ratio),
        harami_small_body_ratio: config.get_double(s, "harami_small_body_ratio", d.harami_small_body_ratio),
        three_methods_small_ratio: config.get_double(s, "three_methods_small_ratio", d.three_methods_small_ratio),
        three_methods_large_ratio: config.get_double(s, "three_methods_large_ratio", d.three_methods_large_ratio),
        gap_ratio: config.get_double(s, "gap_ratio", d.gap_ratio),
        similar_body_ratio: config.get_double(s, "similar_body_ratio", d.similar_body_ratio),
    }
}

fn load_gaps(config: &dyn ConfigPort) -> Result<GapConfig, CryptotaError> {
    let s = "gaps";
    let d = GapConfig::default();
    Ok(GapConfig {
        enabled: config.get_bool(s, "enabled", d.enabled),
        min_gap_pct: optional_fraction(config, s, "min_gap_pct", d.min_gap_pct)?,
        volume_multiplier: optional_fraction(config, s, "volume_multiplier", d.volume_multiplier)?,
        trend_period: optional_period(config, s, "trend_period", d.trend_period)?,
    })
}

fn load_chart(config: &dyn ConfigPort) -> Result<ChartConfig, CryptotaError> {
    let s = "chart_patterns";
    let d = ChartConfig::default();
    Ok(ChartConfig {
        extrema_order: optional_period(config, s, "extrema_order", d.extrema_order)?,
        peak_trough_tolerance: optional_fraction(config, s, "peak_trough_tolerance", d.peak_trough_tolerance)?,
        shoulder_tolerance: optional_fraction(config, s, "shoulder_tolerance", d.shoulder_tolerance)?,
        require_volume_confirm: config.get_bool(s, "require_volume_confirm", d.require_volume_confirm),
        volume_multiplier: optional_fraction(config, s, "volume_multiplier", d.volume_multiplier)?,
        min_pattern_bars: optional_period(config, s, "min_pattern_bars", d.min_pattern_bars)?,
        channel_period: optional_period(config, s, "channel_period", d.channel_period)?,
    })
}

fn load_divergence(
    config: &dyn ConfigPort,
    section: &str,
    tolerance_key: &str,
    d: DivergenceConfig,
) -> Result<DivergenceConfig, CryptotaError> {
    Ok(DivergenceConfig {
        enabled: config.get_bool(section, "enabled", d.enabled),
        lookback: optional_period(config, section, "lookback", d.lookback)?,
        extrema_order: optional_period(config, section, "extrema_order", d.extrema_order)?,
        price_tolerance: optional_fraction(config, section, "price_tolerance", d.price_tolerance)?,
        indicator_tolerance: optional_fraction(config, section, tolerance_key, d.indicator_tolerance)?,
    })
}

fn load_elliott(config: &dyn ConfigPort) -> Result<ElliottConfig, CryptotaError> {
    let d = ElliottConfig::default();
    Ok(ElliottConfig {
        enabled: config.get_bool("elliott", "enabled", d.enabled),
        order: optional_period(config, "elliott", "order", d.order)?,
    })
}

fn load_trendlines(config: &dyn ConfigPort) -> Result<TrendlineConfig, CryptotaError> {
    let s = "trendlines";
    let d = TrendlineConfig::default();
    Ok(TrendlineConfig {
        enabled: config.get_bool(s, "enabled", d.enabled),
        extrema_order: optional_period(config, s, "extrema_order", d.extrema_order)?,
        channel_period: optional_period(config, s, "channel_period", d.channel_period)?,
    })
}

fn load_fibonacci(config: &dyn ConfigPort) -> Result<FibonacciConfig, CryptotaError> {
    let s = "fibonacci";
    let d = FibonacciConfig::default();
    let levels = match config.get_string(s, "levels") {
        Some(raw) => parse_levels(&raw)?,
        None => d.levels,
    };
    Ok(FibonacciConfig {
        swing_lookback: optional_period(config, s, "swing_lookback", d.swing_lookback)?,
        levels,
        round_step: config.get_double(s, "round_step", d.round_step),
    })
}

/// Comma-separated ratios, e.g. `0.382, 0.5, 0.618`.
fn parse_levels(raw: &str) -> Result<Vec<f64>, CryptotaError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<f64>()
                .map_err(|_| invalid("fibonacci", "levels", &format!("cannot parse '{part}'")))
        })
        .collect()
}

fn load_support_resistance(config: &dyn ConfigPort) -> Result<SupportResistanceConfig, CryptotaError> {
    let s = "support_resistance";
    let d = SupportResistanceConfig::default();
    Ok(SupportResistanceConfig {
        extrema_order: optional_period(config, s, "extrema_order", d.extrema_order)?,
        touch_tolerance_pct: optional_fraction(config, s, "touch_tolerance_pct", d.touch_tolerance_pct)?,
    })
}

fn load_fusion(config: &dyn ConfigPort) -> Result<FusionConfig, CryptotaError> {
    let s = "confirmation";
    let d = FusionConfig::default();
    Ok(FusionConfig {
        require_trend: config.get_bool(s, "require_trend", d.require_trend),
        require_volume: config.get_bool(s, "require_volume", d.require_volume),
        volume_period: optional_period(config, s, "volume_period", d.volume_period)?,
        volume_multiplier: optional_fraction(config, s, "volume_multiplier", d.volume_multiplier)?,
        use_candlestick: config.get_bool(s, "use_candlestick", d.use_candlestick),
        use_continuation: config.get_bool(s, "use_continuation", d.use_continuation),
        use_chart_patterns: config.get_bool(s, "use_chart_patterns", d.use_chart_patterns),
        use_divergence: config.get_bool(s, "use_divergence", d.use_divergence),
        use_gaps: config.get_bool(s, "use_gaps", d.use_gaps),
        use_breakouts: config.get_bool(s, "use_breakouts", d.use_breakouts),
        use_trendlines: config.get_bool(s, "use_trendlines", d.use_trendlines),
        use_money_flow: config.get_bool(s, "use_money_flow", d.use_money_flow),
        use_wave: config.get_bool(s, "use_wave", d.use_wave),
        rsi_overbought: required(config, "indicators", "rsi_overbought")?,
        rsi_oversold: required(config, "indicators", "rsi_oversold")?,
    })
}

fn load_risk(config: &dyn ConfigPort) -> RiskConfig {
    let s = "risk";
    let d = RiskConfig::default();
    RiskConfig {
        max_risk_per_trade: config.get_double(s, "max_risk_per_trade", d.max_risk_per_trade),
        stop_loss_atr_multiplier: config.get_double(s, "stop_loss_atr_multiplier", d.stop_loss_atr_multiplier),
        take_profit_rr: config.get_double(s, "take_profit_rr", d.take_profit_rr),
        use_atr_stop: config.get_bool(s, "use_atr_stop", d.use_atr_stop),
        initial_capital: config.get_double(s, "initial_capital", d.initial_capital),
    }
}
