//! Rolling volume-weighted average price over typical prices.

use crate::domain::ohlcv::OhlcvBar;

/// Σ(typical × volume) / Σ volume over `period` bars. Undefined for a
/// window with no volume.
pub fn vwap_values(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if period == 0 {
        return out;
    }
    for i in (period - 1)..bars.len() {
        let window = &bars[i + 1 - period..=i];
        let pv: f64 = window.iter().map(|b| b.typical_price() * b.volume).sum();
        let vol: f64 = window.iter().map(|b| b.volume).sum();
        if vol > 0.0 {
            out[i] = Some(pv / vol);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testkit::bar;

    #[test]
    fn vwap_weights_by_volume() {
        let bars = vec![
            bar(0, 10.0, 10.0, 10.0, 10.0, 100.0),
            bar(1, 20.0, 20.0, 20.0, 20.0, 300.0),
        ];
        let vwap = vwap_values(&bars, 2);
        assert!(vwap[0].is_none());
        assert!((vwap[1].unwrap() - 17.5).abs() < 1e-9);
    }

    #[test]
    fn vwap_zero_volume_undefined() {
        let bars = vec![bar(0, 10.0, 10.0, 10.0, 10.0, 0.0)];
        assert_eq!(vwap_values(&bars, 1), vec![None]);
    }
}
