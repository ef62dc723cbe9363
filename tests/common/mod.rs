#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use cryptota::domain::config::AnalysisConfig;
use cryptota::domain::error::CryptotaError;
pub use cryptota::domain::ohlcv::OhlcvBar;
use cryptota::domain::resample::Timeframe;
use cryptota::ports::data_port::MarketDataPort;
use std::collections::HashMap;
use std::io::Write;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }
}

impl MarketDataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        _timeframe: Timeframe,
        limit: Option<usize>,
    ) -> Result<Vec<OhlcvBar>, CryptotaError> {
        let bars = self.data.get(symbol).cloned().unwrap_or_default();
        let skip = limit.map_or(0, |l| bars.len().saturating_sub(l));
        Ok(bars[skip..].to_vec())
    }
}

/// Hour `i` after 2024-01-01 00:00.
pub fn hour(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::hours(i as i64)
}

pub fn make_bar(i: usize, open: f64, high: f64, low: f64, close: f64) -> OhlcvBar {
    OhlcvBar::new(hour(i), open, high, low, close, 1000.0)
}

/// Hourly bars from (open, high, low, close) rows.
pub fn ohlc_series(rows: &[(f64, f64, f64, f64)]) -> Vec<OhlcvBar> {
    rows.iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| make_bar(i, o, h, l, c))
        .collect()
}

/// Hourly bars oscillating around `base` with a slow drift.
pub fn wave_series(count: usize, base: f64) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| {
            let x = i as f64;
            let close = base + (x * 0.21).sin() * base * 0.05 + x * 0.02;
            let open = close - (x * 0.7).cos() * 0.4;
            let high = open.max(close) + 0.6;
            let low = open.min(close) - 0.6;
            let volume = 1000.0 + ((x * 0.37).sin() + 1.0) * 400.0;
            OhlcvBar::new(hour(i), open, high, low, close, volume)
        })
        .collect()
}

/// Hourly bars following close-to-close returns, each with a fixed spread.
pub fn walk_series(start: f64, returns: &[f64], volumes: &[f64]) -> Vec<OhlcvBar> {
    let mut close = start;
    returns
        .iter()
        .zip(volumes.iter().cycle())
        .enumerate()
        .map(|(i, (&r, &v))| {
            let open = close;
            close = (close * (1.0 + r)).max(1.0);
            let high = open.max(close) * 1.002;
            let low = open.min(close) * 0.998;
            OhlcvBar::new(hour(i), open, high, low, close, v)
        })
        .collect()
}

/// Defaults with the trend and volume gates off and short swing orders, so
/// short synthetic series produce entries.
pub fn trading_config() -> AnalysisConfig {
    let mut config = AnalysisConfig::default();
    config.fusion.require_trend = false;
    config.fusion.require_volume = false;
    config.chart.extrema_order = 2;
    config.divergence.extrema_order = 2;
    config.obv_divergence.extrema_order = 2;
    config.elliott.order = 2;
    config.trendlines.extrema_order = 2;
    config.support_resistance.extrema_order = 2;
    config
}

pub fn bars_to_csv(bars: &[OhlcvBar]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}

pub fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub const VALID_INI: &str = r#"
[data]

[indicators]
ema_short = 9
ema_medium = 21
ema_long = 50
ema_very_long = 200
bollinger_period = 20
bollinger_std_dev = 2.0
macd_fast = 12
macd_slow = 26
macd_signal = 9
rsi_period = 14
rsi_overbought = 70
rsi_oversold = 30
stochastic_period = 14
stochastic_smooth_k = 3
atr_period = 14

[risk]
initial_capital = 100000
max_risk_per_trade = 0.02
stop_loss_atr_multiplier = 2.0
take_profit_rr = 2.0
use_atr_stop = true
"#;
