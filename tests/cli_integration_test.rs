//! CLI integration tests for the enrich, backtest and validate commands.
//!
//! Tests cover:
//! - Config loading from real INI files on disk, with timeframe overrides
//! - Error classes surfaced for bad configs and bad data
//! - Enrich and backtest commands writing CSV outputs
//! - Argument parsing through clap

mod common;

use clap::Parser;
use common::*;
use cryptota::cli::{self, Cli, Command};
use cryptota::domain::error::CryptotaError;
use cryptota::domain::resample::Timeframe;
use std::fs;

mod config_loading {
    use super::*;

    #[test]
    fn valid_config_loads() {
        let ini = write_temp(VALID_INI, ".ini");
        let config = cli::load_analysis_config(ini.path(), None).unwrap();
        assert_eq!(config.timeframe, None);
        assert_eq!(config.indicators.ema_short, 9);
        assert_eq!(config.fusion.rsi_overbought, 70.0);
        assert_eq!(config.risk.initial_capital, 100_000.0);
    }

    #[test]
    fn timeframe_override_wins() {
        let content = VALID_INI.replace("[data]\n", "[data]\ntimeframe = 1h\n");
        let ini = write_temp(&content, ".ini");
        let config = cli::load_analysis_config(ini.path(), Some("4h")).unwrap();
        assert_eq!(config.timeframe, Some(Timeframe::Hour4));

        let config = cli::load_analysis_config(ini.path(), None).unwrap();
        assert_eq!(config.timeframe, Some(Timeframe::Hour1));
    }

    #[test]
    fn unknown_timeframe_override() {
        let ini = write_temp(VALID_INI, ".ini");
        let err = cli::load_analysis_config(ini.path(), Some("7min")).unwrap_err();
        assert!(matches!(err, CryptotaError::UnsupportedResampleRule { rule } if rule == "7min"));
    }

    #[test]
    fn missing_required_key() {
        let content = VALID_INI.replace("rsi_period = 14\n", "");
        let ini = write_temp(&content, ".ini");
        let err = cli::load_analysis_config(ini.path(), None).unwrap_err();
        assert!(matches!(err, CryptotaError::ConfigMissing { key, .. } if key == "rsi_period"));
    }

    #[test]
    fn missing_file_is_config_parse_error() {
        let err = cli::load_analysis_config(std::path::Path::new("/nonexistent/cryptota.ini"), None)
            .unwrap_err();
        assert!(matches!(err, CryptotaError::ConfigParse { .. }));
    }

    #[test]
    fn validate_command() {
        let ini = write_temp(VALID_INI, ".ini");
        assert!(cli::run_validate(ini.path()).is_ok());

        let bad = write_temp(&VALID_INI.replace("max_risk_per_trade = 0.02", "max_risk_per_trade = 2"), ".ini");
        let err = cli::run_validate(bad.path()).unwrap_err();
        assert!(matches!(err, CryptotaError::ConfigInvalid { key, .. } if key == "max_risk_per_trade"));
    }
}

mod commands {
    use super::*;

    #[test]
    fn enrich_writes_one_row_per_bar() {
        let ini = write_temp(VALID_INI, ".ini");
        let data = write_temp(&bars_to_csv(&wave_series(120, 100.0)), ".csv");
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("enriched.csv");

        cli::run_enrich(ini.path(), data.path(), None, Some(&output)).unwrap();

        let text = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 121);
        assert!(lines[0].starts_with("timestamp,open,high,low,close,volume,ema_short"));
        assert!(lines[0].ends_with(",signal"));
        assert!(lines[1].starts_with("2024-01-01 00:00:00,"));
    }

    #[test]
    fn enrich_with_resample() {
        let ini = write_temp(VALID_INI, ".ini");
        let data = write_temp(&bars_to_csv(&wave_series(24 * 20, 100.0)), ".csv");
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("enriched.csv");

        cli::run_enrich(ini.path(), data.path(), Some("4h"), Some(&output)).unwrap();

        let text = fs::read_to_string(&output).unwrap();
        assert_eq!(text.lines().count(), 6 * 20 + 1);
    }

    #[test]
    fn short_history_is_rejected() {
        let ini = write_temp(VALID_INI, ".ini");
        let data = write_temp(&bars_to_csv(&wave_series(30, 100.0)), ".csv");
        let err = cli::run_enrich(ini.path(), data.path(), None, None).unwrap_err();
        assert!(matches!(
            err,
            CryptotaError::InsufficientHistory {
                bars: 30,
                minimum: 50
            }
        ));
    }

    #[test]
    fn missing_column_is_rejected() {
        let ini = write_temp(VALID_INI, ".ini");
        let data = write_temp("timestamp,open,high,low,volume\n2024-01-01,1,2,0.5,10\n", ".csv");
        let err = cli::run_enrich(ini.path(), data.path(), None, None).unwrap_err();
        assert!(matches!(err, CryptotaError::MissingRequiredColumn { column } if column == "close"));
    }

    #[test]
    fn backtest_writes_equity_and_trades() {
        let ini = write_temp(VALID_INI, ".ini");
        let data = write_temp(&bars_to_csv(&wave_series(300, 100.0)), ".csv");
        let dir = tempfile::TempDir::new().unwrap();
        let equity = dir.path().join("equity.csv");
        let trades = dir.path().join("trades.csv");

        let outcome = cli::run_backtest_command(ini.path(), data.path(), None, Some(&equity), Some(&trades)).unwrap();

        assert_eq!(fs::read_to_string(&equity).unwrap().lines().count(), 301);
        assert_eq!(
            fs::read_to_string(&trades).unwrap().lines().count(),
            outcome.portfolio.closed_trades.len() + 1
        );
        assert_eq!(outcome.report.num_trades, outcome.portfolio.closed_trades.len());
    }

    #[test]
    fn execute_dispatches_parsed_arguments() {
        let ini = write_temp(VALID_INI, ".ini");
        let dir = tempfile::TempDir::new().unwrap();
        let data_path = dir.path().join("bars.csv");
        fs::write(&data_path, bars_to_csv(&wave_series(80, 100.0))).unwrap();
        let equity = dir.path().join("equity.csv");

        let parsed = Cli::try_parse_from([
            "cryptota",
            "backtest",
            "--config",
            ini.path().to_str().unwrap(),
            "--data",
            data_path.to_str().unwrap(),
            "--output",
            equity.to_str().unwrap(),
        ])
        .unwrap();
        assert!(matches!(parsed.command, Command::Backtest { .. }));

        cli::execute(parsed.command).unwrap();
        assert!(equity.exists());
    }

    #[test]
    fn validate_requires_config_argument() {
        assert!(Cli::try_parse_from(["cryptota", "validate"]).is_err());
        let parsed = Cli::try_parse_from(["cryptota", "validate", "-c", "x.ini"]).unwrap();
        assert!(matches!(parsed.command, Command::Validate { .. }));
    }
}
