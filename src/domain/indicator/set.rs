//! Per-bar indicator record assembled from the individual indicator modules.

use crate::domain::indicator::atr::atr_values;
use crate::domain::indicator::bollinger::bollinger_values;
use crate::domain::indicator::cmf::cmf_values;
use crate::domain::indicator::macd::macd_columns;
use crate::domain::indicator::obv::obv_values;
use crate::domain::indicator::rsi::rsi_values;
use crate::domain::indicator::stochastic::stochastic_columns;
use crate::domain::indicator::volume_osc::volume_osc_values;
use crate::domain::indicator::vwap::vwap_values;
use crate::domain::indicator::ema_values;
use crate::domain::ohlcv::{OhlcvBar, closes};

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub ema_short: usize,
    pub ema_medium: usize,
    pub ema_long: usize,
    pub ema_very_long: usize,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub stochastic_period: usize,
    pub stochastic_smooth_k: usize,
    pub atr_period: usize,
    pub cmf_period: usize,
    pub vwap_period: usize,
    pub volume_osc_short: usize,
    pub volume_osc_long: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ema_short: 9,
            ema_medium: 21,
            ema_long: 50,
            ema_very_long: 200,
            bollinger_period: 20,
            bollinger_std_dev: 2.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            stochastic_period: 14,
            stochastic_smooth_k: 3,
            atr_period: 14,
            cmf_period: 20,
            vwap_period: 20,
            volume_osc_short: 5,
            volume_osc_long: 20,
        }
    }
}

/// Indicator values for one bar. `None` marks warm-up or an undefined value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorRow {
    pub ema_short: Option<f64>,
    pub ema_medium: Option<f64>,
    pub ema_long: Option<f64>,
    pub ema_very_long: Option<f64>,
    pub bb_mid: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_width: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub rsi: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub atr: Option<f64>,
    pub atr_pct: Option<f64>,
    pub obv: Option<f64>,
    pub cmf: Option<f64>,
    pub vwap: Option<f64>,
    pub volume_osc: Option<f64>,
}

impl IndicatorRow {
    /// Column name and value for every indicator, in output order.
    pub fn named(&self) -> [(&'static str, Option<f64>); 20] {
        [
            ("ema_short", self.ema_short),
            ("ema_medium", self.ema_medium),
            ("ema_long", self.ema_long),
            ("ema_very_long", self.ema_very_long),
            ("bb_mid", self.bb_mid),
            ("bb_upper", self.bb_upper),
            ("bb_lower", self.bb_lower),
            ("bb_width", self.bb_width),
            ("macd", self.macd),
            ("macd_signal", self.macd_signal),
            ("macd_hist", self.macd_hist),
            ("rsi", self.rsi),
            ("stoch_k", self.stoch_k),
            ("stoch_d", self.stoch_d),
            ("atr", self.atr),
            ("atr_pct", self.atr_pct),
            ("obv", self.obv),
            ("cmf", self.cmf),
            ("vwap", self.vwap),
            ("volume_osc", self.volume_osc),
        ]
    }
}

pub fn compute_indicators(bars: &[OhlcvBar], cfg: &IndicatorConfig) -> Vec<IndicatorRow> {
    let close = closes(bars);
    let ema_short = ema_values(&close, cfg.ema_short);
    let ema_medium = ema_values(&close, cfg.ema_medium);
    let ema_long = ema_values(&close, cfg.ema_long);
    let ema_very_long = ema_values(&close, cfg.ema_very_long);

    let bollinger = bollinger_values(bars, cfg.bollinger_period, cfg.bollinger_std_dev);
    let macd = macd_columns(&close, cfg.macd_fast, cfg.macd_slow, cfg.macd_signal);
    let rsi = rsi_values(bars, cfg.rsi_period);
    let (stoch_k, stoch_d) = stochastic_columns(bars, cfg.stochastic_period, cfg.stochastic_smooth_k);
    let atr = atr_values(bars, cfg.atr_period);
    let obv = obv_values(bars);
    let cmf = cmf_values(bars, cfg.cmf_period);
    let vwap = vwap_values(bars, cfg.vwap_period);
    let volume_osc = volume_osc_values(bars, cfg.volume_osc_short, cfg.volume_osc_long);

    (0..bars.len())
        .map(|i| {
            let bands = bollinger[i];
            IndicatorRow {
                ema_short: ema_short[i],
                ema_medium: ema_medium[i],
                ema_long: ema_long[i],
                ema_very_long: ema_very_long[i],
                bb_mid: bands.map(|b| b.middle),
                bb_upper: bands.map(|b| b.upper),
                bb_lower: bands.map(|b| b.lower),
                bb_width: bands.and_then(|b| b.width_pct()),
                macd: macd.line[i],
                macd_signal: macd.signal[i],
                macd_hist: macd.histogram[i],
                rsi: rsi[i],
                stoch_k: stoch_k[i],
                stoch_d: stoch_d[i],
                atr: atr[i],
                atr_pct: atr[i].filter(|_| close[i] != 0.0).map(|a| a / close[i]),
                obv: Some(obv[i]),
                cmf: cmf[i],
                vwap: vwap[i],
                volume_osc: volume_osc[i],
            }
        })
        .collect()
}
