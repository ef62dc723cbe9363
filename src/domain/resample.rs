//! Timeframe aliases and OHLCV aggregation onto a coarser grid.

use crate::domain::error::CryptotaError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::{DateTime, NaiveDateTime};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Min1,
    Min5,
    Min15,
    Min30,
    Hour1,
    Hour2,
    Hour4,
    Day1,
}

impl Timeframe {
    /// Accepts the short aliases (`15min`, `1h`, `1d`) and the pandas
    /// offset style (`15T`, `1H`, `1D`).
    pub fn parse(rule: &str) -> Result<Self, CryptotaError> {
        let tf = match rule.trim() {
            "1min" | "1T" | "1m" => Timeframe::Min1,
            "5min" | "5T" | "5m" => Timeframe::Min5,
            "15min" | "15T" | "15m" => Timeframe::Min15,
            "30min" | "30T" | "30m" => Timeframe::Min30,
            "1h" | "1H" | "60min" | "60T" => Timeframe::Hour1,
            "2h" | "2H" => Timeframe::Hour2,
            "4h" | "4H" => Timeframe::Hour4,
            "1d" | "1D" | "D" => Timeframe::Day1,
            other => {
                return Err(CryptotaError::UnsupportedResampleRule {
                    rule: other.to_string(),
                });
            }
        };
        Ok(tf)
    }

    pub fn seconds(self) -> i64 {
        match self {
            Timeframe::Min1 => 60,
            Timeframe::Min5 => 300,
            Timeframe::Min15 => 900,
            Timeframe::Min30 => 1_800,
            Timeframe::Hour1 => 3_600,
            Timeframe::Hour2 => 7_200,
            Timeframe::Hour4 => 14_400,
            Timeframe::Day1 => 86_400,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::Min1 => "1min",
            Timeframe::Min5 => "5min",
            Timeframe::Min15 => "15min",
            Timeframe::Min30 => "30min",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour2 => "2h",
            Timeframe::Hour4 => "4h",
            Timeframe::Day1 => "1d",
        };
        write!(f, "{s}")
    }
}

/// Smallest positive gap between consecutive bars, in seconds.
pub fn native_step(bars: &[OhlcvBar]) -> Option<i64> {
    bars.windows(2)
        .map(|w| (w[1].timestamp - w[0].timestamp).num_seconds())
        .filter(|&d| d > 0)
        .min()
}

fn epoch_secs(ts: NaiveDateTime) -> i64 {
    ts.and_utc().timestamp()
}

fn from_epoch_secs(secs: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
}

/// Aggregates `bars` into epoch-aligned buckets of `timeframe`.
///
/// Open/high/low/close/volume fold as first/max/min/last/sum. Empty buckets
/// produce no bar. The first and last buckets are dropped when they do not
/// cover the whole bucket at the series' native step. A target no coarser
/// than the native step returns the input unchanged.
pub fn resample(bars: &[OhlcvBar], timeframe: Timeframe) -> Result<Vec<OhlcvBar>, CryptotaError> {
    let bucket = timeframe.seconds();
    let step = match native_step(bars) {
        Some(step) => step,
        None => return Ok(bars.to_vec()),
    };
    if bucket <= step {
        return Ok(bars.to_vec());
    }

    let mut groups: Vec<(i64, Vec<&OhlcvBar>)> = Vec::new();
    for bar in bars {
        let start = epoch_secs(bar.timestamp).div_euclid(bucket) * bucket;
        match groups.last_mut() {
            Some((s, members)) if *s == start => members.push(bar),
            _ => groups.push((start, vec![bar])),
        }
    }

    let last_group = groups.len().saturating_sub(1);
    let mut out = Vec::with_capacity(groups.len());
    for (gi, (start, members)) in groups.iter().enumerate() {
        let (Some(first), Some(last)) = (members.first(), members.last()) else {
            continue;
        };
        if gi == 0 && epoch_secs(first.timestamp) != *start {
            continue;
        }
        if gi == last_group && epoch_secs(last.timestamp) + step < start + bucket {
            continue;
        }
        let timestamp = from_epoch_secs(*start).ok_or_else(|| CryptotaError::DataParse {
            reason: format!("bucket start {start} out of range"),
        })?;
        let high = members.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let low = members.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let volume = members.iter().map(|b| b.volume).sum();
        out.push(OhlcvBar::new(timestamp, first.open, high, low, last.close, volume));
    }

    tracing::debug!(
        input = bars.len(),
        output = out.len(),
        timeframe = %timeframe,
        "resampled series"
    );
    Ok(out)
}
