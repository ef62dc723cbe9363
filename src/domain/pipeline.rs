//! Bar enrichment: runs every analysis stage in order and fuses the result
//! into one signal per bar.

use crate::domain::config::AnalysisConfig;
use crate::domain::divergence::{DivergenceFlags, detect_divergences};
use crate::domain::error::CryptotaError;
use crate::domain::fusion::{Signal, apply_signals};
use crate::domain::indicator::{IndicatorRow, compute_indicators};
use crate::domain::levels::{FibonacciState, LevelState, fibonacci_levels, track_levels};
use crate::domain::ohlcv::{OhlcvBar, validate_series};
use crate::domain::patterns::candlestick::{CandleFlags, detect_candlesticks};
use crate::domain::patterns::chart::{ChartFlags, ChartFormation, detect_chart_patterns};
use crate::domain::patterns::gaps::{Gap, detect_gaps};
use crate::domain::patterns::trendline::{TrendlineState, detect_trendlines};
use crate::domain::patterns::wave::{WaveState, label_waves};
use crate::domain::resample::resample;

/// Bars required after resampling.
pub const MIN_BARS: usize = 50;

/// One input bar with everything derived from it and its predecessors.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedBar {
    pub bar: OhlcvBar,
    pub indicators: IndicatorRow,
    pub candles: CandleFlags,
    pub gap: Option<Gap>,
    pub chart: ChartFlags,
    pub divergence: DivergenceFlags,
    pub wave: WaveState,
    pub trend: TrendlineState,
    pub levels: LevelState,
    pub fib: FibonacciState,
    pub signal: Signal,
}

impl EnrichedBar {
    pub fn new(bar: OhlcvBar) -> Self {
        Self {
            bar,
            indicators: IndicatorRow::default(),
            candles: CandleFlags::default(),
            gap: None,
            chart: ChartFlags::default(),
            divergence: DivergenceFlags::default(),
            wave: WaveState::default(),
            trend: TrendlineState::default(),
            levels: LevelState::default(),
            fib: FibonacciState::default(),
            signal: Signal::Hold,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub bars: Vec<EnrichedBar>,
    pub formations: Vec<ChartFormation>,
}

/// Validates, optionally resamples, and enriches a bar series.
///
/// Structural problems abort the run before any stage executes: an
/// unsorted series, or fewer than [`MIN_BARS`] bars once resampled.
pub fn enrich(bars: &[OhlcvBar], cfg: &AnalysisConfig) -> Result<Enrichment, CryptotaError> {
    validate_series(bars)?;
    let bars = match cfg.timeframe {
        Some(tf) => resample(bars, tf)?,
        None => bars.to_vec(),
    };
    if bars.len() < MIN_BARS {
        return Err(CryptotaError::InsufficientHistory {
            bars: bars.len(),
            minimum: MIN_BARS,
        });
    }
    tracing::info!(bars = bars.len(), timeframe = ?cfg.timeframe, "enriching bar series");

    let indicators = compute_indicators(&bars, &cfg.indicators);
    let candles = detect_candlesticks(&bars, &cfg.candlestick);
    let gaps = detect_gaps(&bars, &indicators, &cfg.gaps);
    let chart = detect_chart_patterns(&bars, &cfg.chart);
    let divergence = detect_divergences(&bars, &indicators, &cfg.divergence, &cfg.obv_divergence);
    let waves = label_waves(&bars, &cfg.elliott);
    let trends = detect_trendlines(&bars, &cfg.trendlines);
    let levels = track_levels(&bars, &cfg.support_resistance);
    let fibs = fibonacci_levels(&bars, &cfg.fibonacci);

    let mut enriched: Vec<EnrichedBar> = bars
        .into_iter()
        .zip(indicators)
        .zip(candles)
        .zip(gaps)
        .zip(chart.flags)
        .zip(divergence)
        .zip(waves)
        .zip(trends)
        .zip(levels)
        .zip(fibs)
        .map(
            |(((((((((bar, indicators), candles), gap), chart), divergence), wave), trend), levels), fib)| EnrichedBar {
                bar,
                indicators,
                candles,
                gap,
                chart,
                divergence,
                wave,
                trend,
                levels,
                fib,
                signal: Signal::Hold,
            },
        )
        .collect();

    apply_signals(&mut enriched, &cfg.fusion);
    Ok(Enrichment {
        bars: enriched,
        formations: chart.formations,
    })
}
