//! Report output port.

use std::path::Path;

use crate::domain::error::CryptotaError;
use crate::domain::metrics::PerformanceReport;
use crate::domain::pipeline::Enrichment;
use crate::domain::portfolio::EquityPoint;
use crate::domain::position::Trade;

pub trait ReportPort {
    fn write_enrichment(&self, enrichment: &Enrichment, output_path: &Path) -> Result<(), CryptotaError>;

    fn write_equity_curve(&self, curve: &[EquityPoint], output_path: &Path) -> Result<(), CryptotaError>;

    fn write_trades(&self, trades: &[Trade], output_path: &Path) -> Result<(), CryptotaError>;

    /// Human-readable performance summary.
    fn summary(&self, report: &PerformanceReport) -> String;
}
