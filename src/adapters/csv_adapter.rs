//! CSV bar files.
//!
//! A header row is required. The timestamp comes from `timestamp` (RFC 3339,
//! `%Y-%m-%d %H:%M:%S`, `%Y-%m-%d` or epoch milliseconds) or `timestamp_ms`.
//! Volume is taken from the first present of `volume_usdt`, `volume_btc`,
//! `volume_contracts`, `volume`.

use crate::domain::error::CryptotaError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::resample::Timeframe;
use crate::ports::data_port::MarketDataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

const VOLUME_COLUMNS: [&str; 4] = ["volume_usdt", "volume_btc", "volume_contracts", "volume"];

/// Serves `{base}/{symbol}_{timeframe}.csv`, with `/` dropped from the symbol.
pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", symbol.replace('/', ""), timeframe))
    }
}

impl MarketDataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: Option<usize>,
    ) -> Result<Vec<OhlcvBar>, CryptotaError> {
        let mut bars = read_bars(self.csv_path(symbol, timeframe))?;
        if let Some(limit) = limit {
            let skip = bars.len().saturating_sub(limit);
            bars.drain(..skip);
        }
        Ok(bars)
    }
}

pub fn read_bars<P: AsRef<Path>>(path: P) -> Result<Vec<OhlcvBar>, CryptotaError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let bars = parse_bars(file)?;
    tracing::debug!(path = %path.display(), bars = bars.len(), "loaded bars");
    Ok(bars)
}

struct Columns {
    timestamp: usize,
    epoch_ms: bool,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, CryptotaError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| CryptotaError::MissingRequiredColumn {
                column: name.to_string(),
            })
        };

        let (timestamp, epoch_ms) = match (find("timestamp"), find("timestamp_ms")) {
            (Some(i), _) => (i, false),
            (None, Some(i)) => (i, true),
            (None, None) => {
                return Err(CryptotaError::MissingRequiredColumn {
                    column: "timestamp".to_string(),
                });
            }
        };
        let volume = VOLUME_COLUMNS
            .iter()
            .find_map(|&name| find(name))
            .ok_or_else(|| CryptotaError::MissingRequiredColumn {
                column: "volume".to_string(),
            })?;

        Ok(Columns {
            timestamp,
            epoch_ms,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume,
        })
    }
}

/// Parses a headed CSV stream into bars, in file order.
pub fn parse_bars<R: Read>(reader: R) -> Result<Vec<OhlcvBar>, CryptotaError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers().map_err(csv_error)?.clone();
    let columns = Columns::locate(&headers)?;

    let mut bars = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(csv_error)?;
        let line = row + 2;
        let field = |index: usize, name: &str| {
            record.get(index).map(str::trim).ok_or_else(|| CryptotaError::DataParse {
                reason: format!("line {line}: missing {name} field"),
            })
        };
        let number = |index: usize, name: &str| -> Result<f64, CryptotaError> {
            let raw = field(index, name)?;
            raw.parse().map_err(|_| CryptotaError::DataParse {
                reason: format!("line {line}: invalid {name} value '{raw}'"),
            })
        };

        let raw_ts = field(columns.timestamp, "timestamp")?;
        let timestamp = if columns.epoch_ms {
            parse_epoch_ms(raw_ts)
        } else {
            parse_timestamp(raw_ts)
        }
        .ok_or_else(|| CryptotaError::DataParse {
            reason: format!("line {line}: invalid timestamp '{raw_ts}'"),
        })?;

        bars.push(OhlcvBar::new(
            timestamp,
            number(columns.open, "open")?,
            number(columns.high, "high")?,
            number(columns.low, "low")?,
            number(columns.close, "close")?,
            number(columns.volume, "volume")?,
        ));
    }
    Ok(bars)
}

fn csv_error(err: csv::Error) -> CryptotaError {
    CryptotaError::DataParse {
        reason: format!("CSV parse error: {err}"),
    }
}

fn parse_epoch_ms(raw: &str) -> Option<NaiveDateTime> {
    let millis = match raw.parse::<i64>() {
        Ok(ms) => ms,
        Err(_) => raw.parse::<f64>().ok().filter(|v| v.is_finite())? as i64,
    };
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if raw.chars().all(|c| c.is_ascii_digit()) {
        return parse_epoch_ms(raw);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn parses_datetime_timestamps() {
        let csv = "timestamp,open,high,low,close,volume\n\
            2024-01-15 00:00:00,100.0,110.0,90.0,105.0,50000\n\
            2024-01-15 04:00:00,105.0,115.0,100.0,110.0,60000\n";
        let bars = parse_bars(csv.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, ts("2024-01-15 00:00:00"));
        assert_eq!(bars[1].timestamp, ts("2024-01-15 04:00:00"));
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000.0);
    }

    #[test]
    fn parses_other_timestamp_formats() {
        assert_eq!(parse_timestamp("2024-01-15T04:00:00Z"), Some(ts("2024-01-15 04:00:00")));
        assert_eq!(parse_timestamp("2024-01-15T06:00:00+02:00"), Some(ts("2024-01-15 04:00:00")));
        assert_eq!(parse_timestamp("2024-01-15"), Some(ts("2024-01-15 00:00:00")));
        assert_eq!(parse_timestamp("1705291200000"), Some(ts("2024-01-15 04:00:00")));
        assert_eq!(parse_timestamp("15/01/2024"), None);
    }

    #[test]
    fn timestamp_ms_column() {
        let csv = "timestamp_ms,open,high,low,close,volume\n1705291200000,1,2,0.5,1.5,10\n";
        let bars = parse_bars(csv.as_bytes()).unwrap();
        assert_eq!(bars[0].timestamp, ts("2024-01-15 04:00:00"));
    }

    #[test]
    fn volume_column_priority() {
        let csv = "timestamp,open,high,low,close,volume,volume_btc,volume_usdt\n\
            2024-01-15,1,2,0.5,1.5,10,20,30\n";
        let bars = parse_bars(csv.as_bytes()).unwrap();
        assert_eq!(bars[0].volume, 30.0);

        let csv = "timestamp,open,high,low,close,volume,volume_contracts\n\
            2024-01-15,1,2,0.5,1.5,10,40\n";
        let bars = parse_bars(csv.as_bytes()).unwrap();
        assert_eq!(bars[0].volume, 40.0);
    }

    #[test]
    fn missing_close_column() {
        let csv = "timestamp,open,high,low,volume\n2024-01-15,1,2,0.5,10\n";
        let err = parse_bars(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CryptotaError::MissingRequiredColumn { column } if column == "close"));
    }

    #[test]
    fn missing_volume_column() {
        let csv = "timestamp,open,high,low,close\n2024-01-15,1,2,0.5,1\n";
        let err = parse_bars(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CryptotaError::MissingRequiredColumn { column } if column == "volume"));
    }

    #[test]
    fn bad_number_reports_line() {
        let csv = "timestamp,open,high,low,close,volume\n\
            2024-01-15,1,2,0.5,1.5,10\n\
            2024-01-16,1,abc,0.5,1.5,10\n";
        let err = parse_bars(csv.as_bytes()).unwrap_err();
        match err {
            CryptotaError::DataParse { reason } => {
                assert!(reason.contains("line 3"), "{reason}");
                assert!(reason.contains("high"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn fetch_ohlcv_reads_symbol_file_and_limits() {
        let dir = TempDir::new().unwrap();
        let csv = "timestamp,open,high,low,close,volume\n\
            2024-01-15 00:00:00,1,2,0.5,1.5,10\n\
            2024-01-15 04:00:00,2,3,1.5,2.5,10\n\
            2024-01-15 08:00:00,3,4,2.5,3.5,10\n";
        fs::write(dir.path().join("BTCUSDT_4h.csv"), csv).unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());

        let all = adapter.fetch_ohlcv("BTC/USDT", Timeframe::Hour4, None).unwrap();
        assert_eq!(all.len(), 3);

        let recent = adapter.fetch_ohlcv("BTC/USDT", Timeframe::Hour4, Some(2)).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].close, 2.5);
    }

    #[test]
    fn fetch_ohlcv_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_ohlcv("ETH/USDT", Timeframe::Day1, None).unwrap_err();
        assert!(matches!(err, CryptotaError::Io(_)));
    }
}
